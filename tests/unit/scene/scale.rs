use super::*;

#[test]
fn linear_maps_domain_onto_range() {
    let x = LinearScale::new((0.0, 50.0), (0.0, 500.0));
    assert_eq!(x.apply(0.0), 0.0);
    assert_eq!(x.apply(25.0), 250.0);
    assert_eq!(x.apply(50.0), 500.0);
}

#[test]
fn degenerate_max_falls_back_to_unit_domain() {
    let mut x = LinearScale::new((0.0, 1.0), (0.0, 100.0));
    x.set_domain_max(0.0);
    assert_eq!(x.domain, (0.0, 1.0));
    x.set_domain_max(f64::NAN);
    assert_eq!(x.domain, (0.0, 1.0));
    x.set_domain_max(40.0);
    assert_eq!(x.domain, (0.0, 40.0));
}

#[test]
fn ticks_use_nice_steps() {
    let x = LinearScale::new((0.0, 50.0), (0.0, 1.0));
    let ticks = x.ticks(12);
    assert_eq!(ticks.first(), Some(&0.0));
    assert_eq!(ticks.last(), Some(&50.0));
    assert_eq!(ticks.len(), 11);
    assert_eq!(x.tick_decimals(12), 0);

    let x = LinearScale::new((0.0, 1234.0), (0.0, 1.0));
    assert_eq!(x.ticks(5), vec![0.0, 200.0, 400.0, 600.0, 800.0, 1000.0, 1200.0]);
}

#[test]
fn fractional_ticks_are_exact_decimals() {
    let x = LinearScale::new((0.0, 1.0), (0.0, 1.0));
    let ticks = x.ticks(12);
    assert_eq!(ticks.len(), 11);
    assert_eq!(ticks[3], 0.3);
    assert_eq!(x.tick_decimals(12), 1);
    assert_eq!(x.tick_format(0.3, 1), "0.3");
}

#[test]
fn ticks_handle_empty_cases() {
    let x = LinearScale::new((0.0, 10.0), (0.0, 1.0));
    assert!(x.ticks(0).is_empty());
    let x = LinearScale::new((3.0, 3.0), (0.0, 1.0));
    assert_eq!(x.ticks(5), vec![3.0]);
}

#[test]
fn band_scale_rounds_and_pads() {
    let y = BandScale::new(3, (0.0, 400.0), 0.5);
    assert_eq!(y.step(), 114.0);
    assert_eq!(y.position(0), 58.0);
    assert_eq!(y.position(1), 172.0);
    assert_eq!(y.bandwidth(), 57.0);
    assert_eq!(y.position(9), y.position(2));
}
