//! `navigate`: resolve a path for the current session.

use eshop_storefront::Storefront;
use eshop_storefront::routes::{Route, Router};

#[allow(clippy::print_stdout)]
pub fn resolve(storefront: &Storefront, path: &str) {
    let requested = Route::parse(path);
    let resolved = Router::resolve(requested.clone(), &storefront.snapshot());
    if resolved == requested {
        println!("{resolved}");
    } else {
        println!("{requested} -> {resolved}");
    }
}
