use std::path::Path;
use std::process;

use env_logger;

use shuttle_dispatch_sim::{DispatchSimConfig, DispatchSimulator};


fn main () {
    env_logger::init();

    // with no config file, simulate the default city with random riders
    let config = match std::env::args().nth(1) {
        Some(path) => DispatchSimConfig::from_file(Path::new(&path)),
        None => Ok(DispatchSimConfig::default()),
    };
    let config = match config {
        Ok(config) => config,
        Err(err) => {
            eprintln!("could not load config: {}", err);
            process::exit(1);
        }
    };

    let has_feed = config.riders_path.is_some();
    let result = DispatchSimulator::new(config).and_then(|mut sim| {
        if !has_feed {
            sim.schedule_random_riders()?;
        }
        sim.run()
    });
    match result {
        Ok(report) => println!("{}", report),
        Err(err) => {
            eprintln!("simulation failed: {}", err);
            process::exit(1);
        }
    }
}
