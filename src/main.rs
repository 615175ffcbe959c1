#[macro_use]
extern crate rocket;

mod api;
mod classifier;
mod error;
mod model_store;
mod types;

use std::path::PathBuf;
use std::sync::Arc;

use rocket_cors::CorsOptions;

use api::{error_catcher, health, list_models, predict};
use model_store::ModelStore;

#[launch]
fn rocket() -> _ {
    let figment = rocket::Config::figment();
    let models_dir = figment
        .extract_inner::<PathBuf>("models_dir")
        .unwrap_or_else(|_| PathBuf::from(model_store::DEFAULT_MODELS_DIR));

    let store =
        ModelStore::bootstrap(&models_dir).expect("model store initialization failed");
    log::info!(
        "serving {} disease model(s) from {}",
        store.len(),
        models_dir.display(),
    );

    // The frontend runs on a different origin; every route stays open.
    let cors = CorsOptions::default()
        .to_cors()
        .expect("permissive CORS options are valid");

    rocket::build()
        .manage(Arc::new(store))
        .attach(cors)
        .mount("/", routes![health, list_models, predict])
        .register("/", catchers![error_catcher])
}
