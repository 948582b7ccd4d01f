use std::fs::File;
use std::io::BufReader;
use std::process;

use log::{error, info, warn};
use muc_directory::config::{DirectoryConfig, TlsConfig};
use muc_directory::directory::Directory;
use muc_directory::server::Server;
use warp::Filter;

fn tls_material_usable(tls: &TlsConfig) -> bool {
    let cert_file = match File::open(&tls.cert_path) {
        Ok(file) => file,
        Err(e) => {
            warn!("Failed to open certificate file {}: {}", tls.cert_path.display(), e);
            return false;
        }
    };
    let key_file = match File::open(&tls.key_path) {
        Ok(file) => file,
        Err(e) => {
            warn!("Failed to open private key file {}: {}", tls.key_path.display(), e);
            return false;
        }
    };

    let certs: Result<Vec<_>, _> = rustls_pemfile::certs(&mut BufReader::new(cert_file)).collect();
    match certs {
        Ok(certs) if !certs.is_empty() => {}
        Ok(_) => {
            warn!("No certificates found in {}", tls.cert_path.display());
            return false;
        }
        Err(e) => {
            warn!("Failed to parse certificate: {}", e);
            return false;
        }
    }

    match rustls_pemfile::private_key(&mut BufReader::new(key_file)) {
        Ok(Some(_)) => true,
        Ok(None) => {
            warn!("No private key found in {}", tls.key_path.display());
            false
        }
        Err(e) => {
            warn!("Failed to parse private key: {}", e);
            false
        }
    }
}

#[tokio::main]
async fn main() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let config = match DirectoryConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            process::exit(1);
        }
    };

    let directory = match Directory::load(&config.snapshot_path).await {
        Ok(directory) => directory,
        Err(e) => {
            error!("{}", e);
            process::exit(1);
        }
    };

    let listen = config.listen;
    let tls = config.tls.clone();
    let routes = Server::new(config, directory)
        .routes()
        .with(warp::cors().allow_any_origin())
        .with(warp::log("muc_directory::http"));

    match tls {
        Some(tls) if tls_material_usable(&tls) => {
            info!("Starting HTTPS server on {}", listen);
            warp::serve(routes)
                .tls()
                .cert_path(&tls.cert_path)
                .key_path(&tls.key_path)
                .run(listen)
                .await;
        }
        Some(_) => {
            warn!("TLS material unusable, falling back to HTTP on {}", listen);
            warp::serve(routes).run(listen).await;
        }
        None => {
            info!("Starting HTTP server on {}", listen);
            warp::serve(routes).run(listen).await;
        }
    }
}
