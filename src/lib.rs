#![deny(unused_variables)]
#![deny(dead_code)]
#![deny(unused_imports)]
#![deny(clippy::no_effect_underscore_binding)]

pub mod batch;
pub mod encode;
pub mod form;
pub mod input;
pub mod model;
