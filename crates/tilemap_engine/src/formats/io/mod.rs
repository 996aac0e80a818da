pub(crate) mod native;
pub(crate) mod raster;
pub(crate) mod tmx;

pub(crate) use native::{load_native, save_native};
pub(crate) use raster::{load_raster, save_raster};
pub(crate) use tmx::{load_tmx, save_tmx};
