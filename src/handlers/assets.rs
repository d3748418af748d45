use std::path::Path;

use actix_files::Files;
use actix_web::web;

/// Mounts the files under `root` at `/`, with `index.html` as the entry page.
/// Register it after the route table so table routes win.
pub fn register(cfg: &mut web::ServiceConfig, root: &Path) {
    if !root.is_dir() {
        log::warn!("Static directory {} not found, serving no files", root.display());
        return;
    }
    cfg.service(Files::new("/", root).index_file("index.html"));
}
