//! Control core for the Sonic Lab sound toy.
//!
//! See [`control`] for the module overview.

#![no_std]

#[cfg(test)]
extern crate std;

pub mod control;
