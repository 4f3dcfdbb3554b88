use bevy::log::LogPlugin;
use bevy::prelude::*;
use std::error::Error;
use std::time::Duration;

use geo_ar_engine::engine::config::ArConfig;
use geo_ar_engine::engine::core::app_setup::create_app;
use geo_ar_engine::engine::core::{FrameDriver, FrameStatus, GeoArEnginePlugin};
use geo_ar_engine::engine::geo::GeoPoint;
use geo_ar_engine::engine::scene::PlacedObjectCollection;
use geo_ar_engine::engine::sensors::SimulatedWalk;
use geo_ar_engine::rpc::web_rpc::{RpcOutbox, WebRpcPlugin};

/// Seeded into headless sessions, which run without an asset server.
const SAVED_PLACES_JSON: &str = include_str!("../assets/objects/saved_places.objects.json");

/// Where the simulated walk starts: in front of the CVS entry of the saved places.
const DEMO_START: (f64, f64) = (32.782149, -96.805218);

const FRAME_INTERVAL: Duration = Duration::from_millis(16);

#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Default)]
struct Args {
    config: Option<String>,
    headless: bool,
    seconds: Option<u64>,
}

#[cfg(not(target_arch = "wasm32"))]
fn parse_args() -> Result<Args, Box<dyn Error>> {
    let mut args = Args::default();
    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => args.config = Some(iter.next().ok_or("--config needs a path")?),
            "--headless" => args.headless = true,
            "--seconds" => {
                let value = iter.next().ok_or("--seconds needs a value")?;
                args.seconds = Some(value.parse()?);
            }
            other => return Err(format!("Unknown argument: {}", other).into()),
        }
    }
    Ok(args)
}

fn main() -> Result<(), Box<dyn Error>> {
    #[cfg(target_arch = "wasm32")]
    {
        let mut app = create_app(ArConfig::default());
        wasm_bindgen_futures::spawn_local(async move {
            app.run();
        });
        Ok(())
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        let args = parse_args()?;
        let config = match &args.config {
            Some(path) => ArConfig::load(path)?,
            None => ArConfig::default(),
        };

        if args.headless {
            run_headless(config, args.seconds.unwrap_or(10))
        } else {
            run_windowed(config);
            Ok(())
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn demo_walk() -> SimulatedWalk {
    SimulatedWalk::standing_at(GeoPoint::new(DEMO_START.0, DEMO_START.1), 0.0)
        .walking(1.2)
        .every(Duration::from_millis(500))
}

#[cfg(not(target_arch = "wasm32"))]
fn run_windowed(config: ArConfig) {
    use geo_ar_engine::engine::core::CancellationToken;
    use geo_ar_engine::engine::sensors::SensorQueue;

    let mut app = create_app(config);
    let cancel = CancellationToken::new();
    let sensors = app
        .world()
        .get_resource::<SensorQueue>()
        .map(|queue| demo_walk().spawn(queue.sender(), cancel.clone()));

    println!("Starting Geo AR with simulated sensors");
    app.run();

    cancel.cancel();
    if let Some(handle) = sensors {
        let _ = handle.join();
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn run_headless(config: ArConfig, seconds: u64) -> Result<(), Box<dyn Error>> {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins)
        .add_plugins(LogPlugin::default())
        .add_plugins(GeoArEnginePlugin { config })
        .add_plugins(WebRpcPlugin);
    let mut driver = FrameDriver::new(app);

    let collection = PlacedObjectCollection::from_json_str(SAVED_PLACES_JSON)?;
    for request in collection.spawn_requests() {
        driver.send_event(request);
    }

    let cancel = driver.cancellation_token();
    let sender = driver.sensor_sender().ok_or("engine has no sensor queue")?;
    let sensors = demo_walk().spawn(sender, cancel.clone());
    let timer = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_secs(seconds));
        cancel.cancel();
    });

    println!("Running headless for {}s", seconds);
    while driver.render_frame() == FrameStatus::Rendered {
        if let Some(mut outbox) = driver
            .world_mut()
            .and_then(|world| world.get_resource_mut::<RpcOutbox>())
        {
            for message in outbox.drain() {
                println!("{}", message);
            }
        }
        std::thread::sleep(FRAME_INTERVAL);
    }

    let _ = sensors.join();
    let _ = timer.join();
    println!("Stopped after {} frames", driver.frames());
    Ok(())
}
