mod common;

mod rebuild;
mod service;
