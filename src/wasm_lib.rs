#![allow(special_module_name)]

mod lib;

// The Wasm target needs a `staticlib` crate-type while native builds need
// `cdylib`, and crate-type can't be selected per target. This file only
// re-exposes lib.rs as an example so emcc can do the final linking.
