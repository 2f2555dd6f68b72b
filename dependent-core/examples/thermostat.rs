//! A thermostat whose derived state tracks a temperature reading.

use dependent_core::{ComputedMethod, ComputedNode, OwnerId, SourceNode};

fn main() {
    let temperature = SourceNode::new();

    let t = temperature.clone();
    let is_hot = ComputedNode::<bool>::builder()
        .parent(&temperature)
        .bind(move |owner| t.get(owner).is_some_and(|v: f64| v > 30.0));

    let t = temperature.clone();
    let scaled = ComputedMethod::<f64, i32>::builder()
        .parent(&temperature)
        .bind_method(move |owner, factor: i32| {
            t.get(owner).unwrap_or(0.0) * f64::from(factor)
        });

    let thermostat = OwnerId::new();

    temperature.set(thermostat, 20.0);
    println!("20.0 degrees -> is_hot: {}", is_hot.get(thermostat));
    println!("scaled x2: {}", scaled.call(thermostat, 2));

    temperature.set(thermostat, 35.0);
    println!("35.0 degrees -> is_hot: {}", is_hot.get(thermostat));
    println!("scaled x3: {}", scaled.call(thermostat, 3));

    // A computed value is never written directly.
    if let Err(err) = is_hot.set(thermostat, false) {
        println!("direct write rejected: {err}");
    }
}
