//! Uploads the source maps of a production build to Rollbar, then deletes
//! the maps and strips their references from the shipped scripts.
//!
//! Exits with 0 on success or when the target is localhost, 1 otherwise.

use std::process;

use rollbar_webclient::sourcemaps::{HttpUploader, Outcome, Publisher, PublisherConfig};

fn main() {
    let dotenv = dotenv::dotenv();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .init();
    if let Err(e) = dotenv {
        if !e.not_found() {
            log::warn!("could not load .env: {}", e);
        }
    }

    let config = PublisherConfig::from_env();
    log::debug!("{:?}", config);
    let uploader = HttpUploader::new(&config.endpoint);
    let publisher = Publisher::new(config, uploader);

    match publisher.run() {
        Ok(Outcome::SkippedLocalhost) => process::exit(0),
        Ok(Outcome::Published(summary)) => {
            summary.log();
            if !summary.is_complete() {
                log::warn!("Some source maps need a re-run");
            }
            process::exit(0)
        }
        Err(e) => {
            log::error!("{}", e);
            process::exit(1)
        }
    }
}
