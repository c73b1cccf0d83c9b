//! Integration tests for the circuitsim engine

use std::collections::HashSet;

use approx::assert_relative_eq;
use circuitsim::prelude::*;

/// Drive `src` with `values`, one per step, and collect `probe` output 0
fn drive(machine: &mut Machine, src: CircuitId, probe: CircuitId, values: &[f64]) -> Vec<f64> {
    values
        .iter()
        .map(|&v| {
            machine.set_external_input(src, 0, v).unwrap();
            machine.step();
            machine.output_value(probe, 0).unwrap()
        })
        .collect()
}

fn ramp(n: usize) -> Vec<f64> {
    (0..n).map(|i| (i as f64 * 0.37).sin() + 0.1 * i as f64).collect()
}

#[test]
fn test_indices_stay_valid_as_graph_grows() {
    let mut machine = Machine::new();
    let first = machine.add_math("opADD", 2).unwrap();
    let first_inputs = machine.inputs(first).unwrap().to_vec();
    let first_outputs = machine.outputs(first).unwrap().to_vec();

    machine.set_external_input(first, 0, 1.5).unwrap();
    machine.set_external_input(first, 1, 2.0).unwrap();
    machine.run(1).unwrap();

    for i in 0..20 {
        let c = machine.add_container().unwrap();
        machine.add_boundary_channel(c, Direction::Input).unwrap();
        machine.inside(c).unwrap().add_delay(i).unwrap();
        machine.add_gain(i as f64).unwrap();
    }

    assert_eq!(machine.inputs(first).unwrap(), first_inputs.as_slice());
    assert_eq!(machine.outputs(first).unwrap(), first_outputs.as_slice());
    assert_eq!(machine.value(first_outputs[0]).unwrap(), 3.5);
    assert_eq!(machine.kind(first).unwrap(), Behavior::Add);
}

#[test]
fn test_output_channels_are_disjoint() {
    let mut machine = Machine::new();
    machine.add_math("opMUL", 4).unwrap();
    machine.add_oscillator().unwrap();
    machine.add_trilinear(Grid3::new(vec![0.0; 16], 2, [2, 2, 2], [1.0; 3], [0.0; 3]).unwrap())
        .unwrap();
    let c = machine.add_container().unwrap();
    machine.add_boundary_channel(c, Direction::Input).unwrap();
    machine.add_boundary_channel(c, Direction::Output).unwrap();
    machine.inside(c).unwrap().add_minmax(3).unwrap();
    machine.add_peak_detector(false).unwrap();

    let mut seen = HashSet::new();
    for i in 0..machine.num_circuits() {
        for &ch in machine.outputs(CircuitId::new(i)).unwrap() {
            assert_ne!(ch, ChannelId::TIME);
            assert!(seen.insert(ch), "channel {ch} written twice");
        }
    }
}

#[test]
fn test_eager_source_is_seen_in_same_step() {
    let mut machine = Machine::new();
    let a = machine.add_gain(1.0).unwrap();
    let b = machine.add_gain(1.0).unwrap();
    machine.connect(a, 0, b, 0).unwrap();
    machine.set_eager(a, true).unwrap();

    let input = ramp(8);
    let output = drive(&mut machine, a, b, &input);
    assert_eq!(output, input);
}

#[test]
fn test_deferred_source_is_seen_next_step() {
    let mut machine = Machine::new();
    let a = machine.add_gain(1.0).unwrap();
    let b = machine.add_gain(1.0).unwrap();
    machine.connect(a, 0, b, 0).unwrap();

    let input = ramp(8);
    let output = drive(&mut machine, a, b, &input);
    assert_eq!(output[0], 0.0);
    assert_eq!(&output[1..], &input[..7]);
}

#[test]
fn test_reader_before_eager_writer_still_lags() {
    // order decides, not wiring: b runs before a even though it reads a
    let mut machine = Machine::new();
    let b = machine.add_gain(1.0).unwrap();
    let a = machine.add_gain(1.0).unwrap();
    machine.connect(a, 0, b, 0).unwrap();
    machine.set_eager(a, true).unwrap();

    let input = ramp(5);
    let output = drive(&mut machine, a, b, &input);
    assert_eq!(output[0], 0.0);
    assert_eq!(&output[1..], &input[..4]);
}

/// src → gain(2, eager) → integral → probe, flat or with the middle pair in
/// a container
fn scale_and_integrate(contained: bool, eager_container: bool) -> (Machine, CircuitId, CircuitId) {
    let mut machine = Machine::new();
    let src = machine.add_gain(1.0).unwrap();

    let middle = if contained {
        let c = machine.add_container().unwrap();
        machine.add_boundary_channel(c, Direction::Input).unwrap();
        machine.add_boundary_channel(c, Direction::Output).unwrap();
        machine.set_eager(c, eager_container).unwrap();

        let mut inner = machine.inside(c).unwrap();
        let gain = inner.add_gain(2.0).unwrap();
        let integral = inner.add_integral().unwrap();
        let m = inner.machine();
        m.set_eager(gain, true).unwrap();
        m.connect_boundary_input(c, 0, gain, 0).unwrap();
        m.connect(gain, 0, integral, 0).unwrap();
        m.connect_boundary_output(integral, 0, c, 0).unwrap();
        machine.connect(src, 0, c, 0).unwrap();
        c
    } else {
        let gain = machine.add_gain(2.0).unwrap();
        let integral = machine.add_integral().unwrap();
        machine.set_eager(gain, true).unwrap();
        machine.connect(src, 0, gain, 0).unwrap();
        machine.connect(gain, 0, integral, 0).unwrap();
        integral
    };

    let probe = machine.add_gain(1.0).unwrap();
    machine.connect(middle, 0, probe, 0).unwrap();
    (machine, src, probe)
}

#[test]
fn test_eager_container_matches_flattened_graph() {
    let input = ramp(40);

    let (mut flat, src, probe) = scale_and_integrate(false, false);
    let expected = drive(&mut flat, src, probe, &input);

    let (mut nested, src, probe) = scale_and_integrate(true, true);
    let actual = drive(&mut nested, src, probe, &input);

    assert!(expected.iter().any(|&v| v != 0.0));
    for (a, e) in actual.iter().zip(&expected) {
        assert_relative_eq!(*a, *e, epsilon = 1e-12);
    }
}

#[test]
fn test_deferred_container_adds_one_step() {
    let input = ramp(20);

    let (mut flat, src, probe) = scale_and_integrate(false, false);
    let expected = drive(&mut flat, src, probe, &input);

    let (mut nested, src, probe) = scale_and_integrate(true, false);
    let actual = drive(&mut nested, src, probe, &input);

    assert_eq!(actual[0], 0.0);
    for (a, e) in actual[1..].iter().zip(&expected) {
        assert_relative_eq!(*a, *e, epsilon = 1e-12);
    }
}

#[test]
fn test_nested_containers_compose() {
    let input = ramp(30);

    let (mut flat, src, probe) = scale_and_integrate(false, false);
    let expected = drive(&mut flat, src, probe, &input);

    // outer container wrapping an inner container wrapping the pair
    let mut machine = Machine::new();
    let src = machine.add_gain(1.0).unwrap();
    let outer = machine.add_container().unwrap();
    machine.add_boundary_channel(outer, Direction::Input).unwrap();
    machine.add_boundary_channel(outer, Direction::Output).unwrap();
    machine.set_eager(outer, true).unwrap();

    let inner = machine.inside(outer).unwrap().add_container().unwrap();
    machine.add_boundary_channel(inner, Direction::Input).unwrap();
    machine.add_boundary_channel(inner, Direction::Output).unwrap();
    machine.set_eager(inner, true).unwrap();

    let gain = machine.inside(inner).unwrap().add_gain(2.0).unwrap();
    let integral = machine.inside(inner).unwrap().add_integral().unwrap();
    machine.set_eager(gain, true).unwrap();
    machine.connect_boundary_input(inner, 0, gain, 0).unwrap();
    machine.connect(gain, 0, integral, 0).unwrap();
    machine.connect_boundary_output(integral, 0, inner, 0).unwrap();

    machine.connect_boundary_input(outer, 0, inner, 0).unwrap();
    machine.connect_boundary_output(inner, 0, outer, 0).unwrap();
    machine.connect(src, 0, outer, 0).unwrap();

    let probe = machine.add_gain(1.0).unwrap();
    machine.connect(outer, 0, probe, 0).unwrap();

    let actual = drive(&mut machine, src, probe, &input);
    for (a, e) in actual.iter().zip(&expected) {
        assert_relative_eq!(*a, *e, epsilon = 1e-12);
    }
    assert_eq!(machine.top_level(), &[src, outer, probe]);
    assert_eq!(machine.sub_circuits(outer).unwrap(), &[inner]);
}

#[test]
fn test_container_external_input_and_clock() {
    let mut machine = Machine::new().with_dt(0.5).unwrap();
    let c = machine.add_container().unwrap();
    machine.add_boundary_channel(c, Direction::Input).unwrap();
    machine.add_boundary_channel(c, Direction::Output).unwrap();
    machine.set_eager(c, true).unwrap();

    let sum = machine.inside(c).unwrap().add_math("opADD", 2).unwrap();
    machine.set_eager(sum, true).unwrap();
    machine.connect_boundary_input(c, 0, sum, 0).unwrap();
    machine.connect_container_clock(c, sum, 1).unwrap();
    machine.connect_boundary_output(sum, 0, c, 0).unwrap();

    machine.set_external_input(c, 0, 10.0).unwrap();
    machine.run(3).unwrap();

    // the container clock is advanced before its sub-circuits run
    assert_relative_eq!(machine.output_value(c, 0).unwrap(), 11.5);
    assert_relative_eq!(machine.time(), 1.5);
}

#[test]
fn test_container_port_errors() {
    let mut machine = Machine::new();
    let c = machine.add_container().unwrap();
    let g = machine.add_gain(1.0).unwrap();

    assert!(matches!(
        machine.connect(g, 0, c, 0),
        Err(Error::NoSuchSlot {
            direction: Direction::Input,
            ..
        })
    ));
    assert!(matches!(
        machine.connect_boundary_output(g, 0, c, 0),
        Err(Error::NoSuchSlot {
            direction: Direction::Output,
            ..
        })
    ));
    assert!(matches!(
        machine.connect_container_clock(g, g, 0),
        Err(Error::NotAContainer(_))
    ));
    assert_eq!(machine.error_count(), 3);
}

#[test]
fn test_adder_with_single_input_is_identity() {
    let mut machine = Machine::new();
    let add = machine.add_math("opADD", 1).unwrap();
    let input = ramp(10);
    for &v in &input {
        machine.set_external_input(add, 0, v).unwrap();
        machine.step();
        assert_eq!(machine.output_value(add, 0).unwrap(), v);
    }
}

#[test]
fn test_multiplier_over_three_inputs() {
    let mut machine = Machine::new();
    let mul = machine.add_math("opMUL", 3).unwrap();
    for (slot, v) in [2.0, 3.0, 5.0].into_iter().enumerate() {
        machine.set_external_input(mul, slot, v).unwrap();
    }
    machine.run(1).unwrap();
    assert_eq!(machine.output_value(mul, 0).unwrap(), 30.0);
}

#[test]
fn test_delay_replays_after_n_steps() {
    let n = 4;
    let mut machine = Machine::new();
    let delay = machine.add_delay(n).unwrap();

    let input: Vec<f64> = (1..=12).map(f64::from).collect();
    let output = drive(&mut machine, delay, delay, &input);

    assert!(output[..n].iter().all(|&v| v == 0.0));
    assert_eq!(&output[n..], &input[..input.len() - n]);
}

#[test]
fn test_oscillator_phase_returns_after_one_period() {
    let (freq, dt) = (4.0, 0.0025);
    let mut machine = Machine::new().with_dt(dt).unwrap();
    let osc = machine.add_oscillator().unwrap();
    machine.set_external_input(osc, 0, freq).unwrap();
    machine.set_external_input(osc, 1, 1.0).unwrap();

    machine.run_for(1.0 / freq).unwrap();

    let phase = machine.params(osc).unwrap()[0];
    assert!(phase.min(1.0 - phase) < freq * dt);
    let sin = machine.output_value(osc, 0).unwrap();
    let cos = machine.output_value(osc, 1).unwrap();
    assert!(sin.abs() <= 1.0 && cos.abs() <= 1.0);
    assert_relative_eq!(sin * sin + cos * cos, 1.0, epsilon = 1e-12);
}

#[test]
fn test_proportional_only_controller() {
    let mut machine = Machine::new();
    let pi = machine.add_pi(1.0, 0.0).unwrap();
    machine.set_external_input(pi, 0, 0.0).unwrap();
    machine.set_external_input(pi, 1, 2.0).unwrap();

    for _ in 0..10 {
        machine.step();
        assert_eq!(machine.output_value(pi, 0).unwrap(), 2.0);
    }
    assert_relative_eq!(machine.time(), 0.1, epsilon = 1e-12);
}

#[test]
fn test_lowpass_settles_to_gain() {
    let mut machine = Machine::new().with_dt(0.001).unwrap();
    let lp = machine.add_lowpass(10.0, 0.707, 3.0).unwrap();
    machine.set_external_input(lp, 0, 1.0).unwrap();
    machine.run(2000).unwrap();
    assert_relative_eq!(machine.output_value(lp, 0).unwrap(), 3.0, epsilon = 1e-6);
}

#[test]
fn test_construction_errors_block_run_until_acknowledged() {
    let mut machine = Machine::new();
    let g = machine.add_gain(2.0).unwrap();
    assert!(machine.add_logic("opFOO", 2).is_err());
    assert!(machine.add_compare("opADD").is_err());
    assert_eq!(machine.error_count(), 2);

    let err = machine.run(5).unwrap_err();
    assert!(matches!(err, Error::Unacknowledged { count: 2 }));
    assert_eq!(machine.steps(), 0);

    let errors = machine.take_errors();
    assert!(matches!(errors[0], Error::UnknownKind { .. }));
    assert!(matches!(errors[1], Error::KindMismatch { .. }));

    machine.set_external_input(g, 0, 1.0).unwrap();
    machine.run(5).unwrap();
    assert_eq!(machine.steps(), 5);
    assert_eq!(machine.output_value(g, 0).unwrap(), 2.0);
}

#[test]
fn test_dump_describes_every_circuit() {
    let mut machine = Machine::new();
    let a = machine.add_gain(1.0).unwrap();
    let b = machine.add_logic("opAND", 2).unwrap();
    machine.connect(a, 0, b, 1).unwrap();

    let mut out = Vec::new();
    machine.dump(&mut out).unwrap();
    let text = String::from_utf8(out).unwrap();

    assert!(text.contains("circuit [0] (gain)"));
    assert!(text.contains("circuit [1] (opAND)"));
    assert_eq!(machine.original_inputs(b).unwrap().len(), 2);
    assert_ne!(machine.inputs(b).unwrap()[1], machine.original_inputs(b).unwrap()[1]);
    assert_eq!(machine.inputs(b).unwrap()[1], machine.outputs(a).unwrap()[0]);
}
