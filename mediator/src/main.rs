use std::error::Error;
use std::fs::File;

use chrono::Utc;
use config::Config;
use state::Storage;

use liveclip_mediator::Mediator;

/*****************************************
 * Global state and associated functions *
 *****************************************/

#[derive(Debug)]
pub struct MediatorConfig {
    address: String,
    port: u16,

    /// Empty means stdout only.
    log_filename: String,
    /// 0 means the action buffer is never trimmed.
    action_queue_capacity: usize,
}

// We have no synchronization on CFG, as it is only written to at startup.
static CFG: Storage<MediatorConfig> = Storage::new();

/*****************************
 * Configuration and logging *
 *****************************/

fn read_configuration() -> Result<(), Box<dyn Error>> {
    let settings = Config::builder()
        .set_default("address", "127.0.0.1")?
        .set_default("port", 1234)?
        .set_default("log_filename", "")?
        .set_default("action_queue_capacity", 0)?
        .add_source(config::File::with_name("Mediator").required(false))
        // Add in settings from env, with a prefix of MED, e.g. MED_PORT=1996
        .add_source(config::Environment::with_prefix("MED"))
        .build()?;

    let address = settings.get_string("address")?;
    let port = settings.get("port")?;
    let log_filename = settings.get_string("log_filename")?;
    let action_queue_capacity = settings.get("action_queue_capacity")?;

    let cfg = MediatorConfig {
        address,
        port,
        log_filename,
        action_queue_capacity,
    };

    CFG.set(cfg);
    Ok(())
}

fn setup_logging() -> Result<(), fern::InitError> {
    let log_level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    let mut dispatch = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}[{}] {}",
                Utc::now().format("[%Y-%m-%d %H:%M:%S.%6f]"),
                record.level(),
                message
            ))
        })
        .level(log_level)
        .chain(std::io::stdout());

    let log_filename = &CFG.get().log_filename;
    if !log_filename.is_empty() {
        dispatch = dispatch.chain(File::create(log_filename)?);
    }
    dispatch.apply()?;
    Ok(())
}

/****************************
 * Main program entry point *
 ****************************/

#[rocket::main]
async fn main() -> Result<(), rocket::Error> {
    // Initialisation
    read_configuration().expect("could not parse configuration");
    setup_logging().expect("could not set up logging");
    log::info!("Configuration {:?}", CFG.get());

    let cfg = CFG.get();
    let mediator = Mediator::new(cfg.action_queue_capacity);

    // Spawn the web framework.
    let figment = liveclip_mediator::figment(&cfg.address, cfg.port);
    let rocket = liveclip_mediator::rocket(figment, mediator).ignite().await?;
    let _rocket = rocket.launch().await?;

    Ok(())
}
