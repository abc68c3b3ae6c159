// SPDX-License-Identifier: Apache-2.0

pub mod circuit;
pub mod io;
pub mod parse;
