use lens_core::model::{REG_VCM_CODE_LSB, REG_VCM_CODE_MSB};
use lens_core::{
    ActuatorError, ActuatorModel, ActuatorParams, Direction, FocusState, MOVE_FAR, MOVE_NEAR,
    Ov5693, RegionBoundary, RegionMap, Report, VcmActuator,
};
use lens_hardware::{SimulatedBus, SimulatedPower};
use lens_traits::delay::test_delay::RecordingDelay;
use rstest::rstest;

fn fixture_params() -> ActuatorParams {
    ActuatorParams {
        initial_code: 100,
        regions: RegionMap::new(vec![RegionBoundary::new(2, 32), RegionBoundary::new(52, 16)])
            .unwrap(),
        ..Ov5693.default_params()
    }
}

fn ready_actuator(bus: &SimulatedBus) -> VcmActuator<SimulatedBus, SimulatedPower> {
    let act = VcmActuator::builder()
        .with_bus(bus.clone())
        .with_power(SimulatedPower::new())
        .with_params(fixture_params())
        .with_delay(RecordingDelay::new())
        .build()
        .unwrap();
    act.init_table().unwrap();
    bus.clear();
    act
}

fn error_of(err: &Report) -> &ActuatorError {
    err.downcast_ref::<ActuatorError>().expect("typed actuator error")
}

#[test]
fn far_from_zero_clamps_without_bus_traffic() {
    let bus = SimulatedBus::new();
    let act = ready_actuator(&bus);
    let st = act.move_focus(Direction::Far, 5).unwrap();
    assert_eq!(st, FocusState { step: 0, code: 100 });
    assert_eq!(bus.attempts(), 0);
}

#[test]
fn near_three_from_zero_follows_region_increments() {
    let bus = SimulatedBus::new();
    let act = ready_actuator(&bus);
    let st = act.move_focus(Direction::Near, 3).unwrap();
    // 100 -> 132 -> 164 -> 180
    assert_eq!(st, FocusState { step: 3, code: 180 });
    let w: Vec<(u16, u16)> = bus.writes().iter().map(|w| (w.reg, w.value)).collect();
    assert_eq!(w, vec![(REG_VCM_CODE_MSB, 0x00), (REG_VCM_CODE_LSB, 180)]);
    assert_eq!(act.focus_state().unwrap(), Some(st));
}

#[test]
fn beyond_total_steps_clamps_to_last_step() {
    let bus = SimulatedBus::new();
    let act = ready_actuator(&bus);
    let st = act.move_focus(Direction::Near, 1000).unwrap();
    assert_eq!(st.step, 52);
    // 100 + 64 + 50 * 16 = 964 = 0x3C4
    assert_eq!(st.code, 964);
    let w: Vec<(u16, u16)> = bus.writes().iter().map(|w| (w.reg, w.value)).collect();
    assert_eq!(w, vec![(REG_VCM_CODE_MSB, 0x03), (REG_VCM_CODE_LSB, 0xC4)]);
}

#[rstest]
#[case(Direction::Near, 10, Direction::Far, 4, 6)]
#[case(Direction::Near, 10, Direction::Far, 40, 0)]
#[case(Direction::Near, 50, Direction::Near, 40, 52)]
#[case(Direction::Near, 5, Direction::Near, -2, 3)]
fn sequential_moves(
    #[case] d1: Direction,
    #[case] n1: i32,
    #[case] d2: Direction,
    #[case] n2: i32,
    #[case] expected_step: u16,
) {
    let bus = SimulatedBus::new();
    let act = ready_actuator(&bus);
    act.move_focus(d1, n1).unwrap();
    let st = act.move_focus(d2, n2).unwrap();
    assert_eq!(st.step, expected_step);
    assert_eq!(Some(st.code), act.table().unwrap().unwrap().code(expected_step));
}

#[test]
fn write_failure_leaves_position_and_reports_io() {
    let bus = SimulatedBus::new();
    let act = ready_actuator(&bus);
    act.move_focus(Direction::Near, 4).unwrap();
    let before = act.focus_state().unwrap();

    // Fail the LSB write of the next move.
    let attempts = bus.attempts();
    let failing = bus.clone().fail_at_write(attempts + 2);
    let err = act.move_focus(Direction::Near, 2).unwrap_err();
    assert!(matches!(error_of(&err), ActuatorError::Io(_)));
    assert_eq!(act.focus_state().unwrap(), before);

    // The same move goes through once the bus recovers.
    failing.heal();
    let st = act.move_focus(Direction::Near, 2).unwrap();
    assert_eq!(st.step, 6);
}

#[test]
fn msb_failure_issues_no_lsb_write() {
    let bus = SimulatedBus::new();
    let act = ready_actuator(&bus);
    let _failing = bus.clone().fail_register(REG_VCM_CODE_MSB);
    let err = act.move_focus(Direction::Near, 1).unwrap_err();
    assert!(matches!(error_of(&err), ActuatorError::Io(_)));
    assert_eq!(bus.attempts(), 1);
    assert!(bus.writes().is_empty());
    assert_eq!(act.focus_state().unwrap().unwrap().step, 0);
}

#[test]
fn invalid_raw_direction_touches_nothing() {
    let bus = SimulatedBus::new();
    let act = ready_actuator(&bus);
    let err = act.move_focus_raw(42, 3).unwrap_err();
    assert!(matches!(error_of(&err), ActuatorError::InvalidArgument(_)));
    assert_eq!(bus.attempts(), 0);
    assert_eq!(act.focus_state().unwrap().unwrap().step, 0);
}

#[test]
fn raw_directions_move() {
    let bus = SimulatedBus::new();
    let act = ready_actuator(&bus);
    assert_eq!(act.move_focus_raw(MOVE_NEAR, 2).unwrap().step, 2);
    assert_eq!(act.move_focus_raw(MOVE_FAR, 1).unwrap().step, 1);
}

#[test]
fn move_before_build_is_not_ready() {
    let bus = SimulatedBus::new();
    let act = VcmActuator::builder()
        .with_bus(bus.clone())
        .with_power(SimulatedPower::new())
        .with_delay(RecordingDelay::new())
        .build()
        .unwrap();
    let err = act.move_focus(Direction::Near, 1).unwrap_err();
    assert_eq!(error_of(&err), &ActuatorError::NotReady);
    assert_eq!(bus.attempts(), 0);
    assert!(act.focus_state().unwrap().is_none());
}
