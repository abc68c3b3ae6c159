// SPDX-License-Identifier: Apache-2.0

use std::io::Write;

use faultsim::coverage::{write_report, Coverage, ReportHeader};
use faultsim::fault::{full_fault_list, write_fault_list};
use faultsim::fault_sim::{run_fault_sim, FaultLedger, FaultSimOptions, ParallelismStrategy};
use faultsim::netlist::io::{load_faults_from_path, load_netlist_from_path};
use faultsim::test_utils::{exhaustive_vectors, C17_BENCH};
use faultsim::vector::parse_vectors;
use flate2::write::GzEncoder;
use flate2::Compression;
use pretty_assertions::assert_eq;

#[test]
fn test_c17_exhaustive_vectors_detect_every_fault() {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = tempfile::tempdir().unwrap();

    let netlist_path = dir.path().join("c17.bench.gz");
    let mut encoder = GzEncoder::new(
        std::fs::File::create(&netlist_path).unwrap(),
        Compression::default(),
    );
    encoder.write_all(C17_BENCH.as_bytes()).unwrap();
    encoder.finish().unwrap();
    let circuit = load_netlist_from_path(&netlist_path).unwrap();
    assert_eq!(circuit.name, "c17");

    // Round-trip the generated fault list through a file, like the driver.
    let faults_path = dir.path().join("c17_faults.txt");
    let mut faults_file = std::fs::File::create(&faults_path).unwrap();
    write_fault_list(&mut faults_file, "c17.bench", &full_fault_list(&circuit)).unwrap();
    drop(faults_file);
    let faults = load_faults_from_path(&faults_path).unwrap();
    assert_eq!(faults.len(), 46);

    let vectors = parse_vectors(&exhaustive_vectors(circuit.input_width()).join("\n"));
    let mut ledger = FaultLedger::new(faults);
    let report =
        run_fault_sim(&circuit, &vectors, &mut ledger, &FaultSimOptions::default()).unwrap();
    assert_eq!(report.vectors.len(), 32);
    assert_eq!(
        Coverage::of(&ledger),
        Coverage {
            detected: 46,
            total: 46
        }
    );

    let mut out: Vec<u8> = Vec::new();
    let header = ReportHeader {
        netlist: "c17.bench.gz".to_string(),
        vectors: "exhaustive".to_string(),
        faults: "c17_faults.txt".to_string(),
    };
    write_report(&mut out, &header, &report, &ledger).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("tv1 = 00000 -> 00 (good)\n"));
    assert!(text.contains("tv32 = 11111 -> 10 (good)\n"));
    assert!(text.ends_with("undetected faults: 0\n\nfault coverage: 46/46 = 100%\n"));
}

#[test]
fn test_a_few_vectors_leave_faults_undetected() {
    let circuit = faultsim::netlist::parse::parse_netlist_str("c17", C17_BENCH).unwrap();
    let mut ledger = FaultLedger::new(full_fault_list(&circuit));
    let options = FaultSimOptions {
        parallelism: ParallelismStrategy::SingleThreaded,
        ..FaultSimOptions::default()
    };
    run_fault_sim(&circuit, &parse_vectors("00000\n"), &mut ledger, &options).unwrap();
    let after_one = ledger.detected_count();
    assert!(after_one > 0 && after_one < 46);

    // A second call only ever adds detections.
    run_fault_sim(&circuit, &parse_vectors("11111\n"), &mut ledger, &options).unwrap();
    assert!(ledger.detected_count() >= after_one);
}
