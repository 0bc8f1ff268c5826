//! `usbmimic` — a USB device emulator and host-fingerprinting framework.
//!
//! The core (modules `usb`, `phy`, `emulation`) builds and drives a
//! software USB device against a host over a transport abstraction; the
//! `devices` module supplies concrete device assemblies; `fingerprint`
//! turns the resulting request traffic into OS guesses; `repl` lets a user
//! edit a running device's string descriptors.
pub mod cli;
pub mod devices;
pub mod emulation;
pub mod error;
pub mod fingerprint;
pub mod phy;
pub mod repl;
pub mod usb;
