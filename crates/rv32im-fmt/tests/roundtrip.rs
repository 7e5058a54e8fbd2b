//! Exercises both gate-list formats through real files rather than
//! in-memory buffers, matching how a CLI driver would actually use them.

use std::fs::File;
use std::io::BufReader;

use rv32im_circuit::{Circuit, GateKind, WireId};
use rv32im_fmt::{read_flat, read_layered, write_flat, write_layered};

fn sample_circuit() -> Circuit {
    let mut circuit = Circuit::new(6, 1).unwrap();
    let a = WireId::from(2);
    let b = WireId::from(3);
    let c = WireId::from(4);
    let x = circuit.emit_gate(a, b, GateKind::Xor);
    let y = circuit.emit_gate(b, c, GateKind::And);
    let z = circuit.emit_gate(x, y, GateKind::Xor);
    circuit.push_output(z);
    circuit
}

#[test]
fn flat_file_round_trips_to_an_identical_gate_list() {
    let original = sample_circuit();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("circuit.flat");

    write_flat(&original, File::create(&path).unwrap()).unwrap();
    let parsed = read_flat(BufReader::new(File::open(&path).unwrap())).unwrap();
    let rebuilt = parsed.into_circuit().unwrap();

    assert_eq!(original.gates(), rebuilt.gates());
}

#[test]
fn layered_file_round_trips_to_an_identical_gate_list() {
    let original = sample_circuit();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("circuit.layered");

    write_layered(&original, File::create(&path).unwrap()).unwrap();
    let parsed = read_layered(BufReader::new(File::open(&path).unwrap())).unwrap();
    let rebuilt = parsed.into_circuit().unwrap();

    assert_eq!(original.gates(), rebuilt.gates());
}
