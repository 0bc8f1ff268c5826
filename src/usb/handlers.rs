//! Component G — class/vendor handler registries, plus the `mutable` fuzz
//! hook of design note "dynamic class generation" (§9 of SPEC_FULL.md).
//!
//! A class (or vendor interface) builds its table in two layers: a set of
//! *built-in* handlers inherited from its parent class, and a set of
//! *local* handlers that override them by request number. The effective,
//! per-interface table is the local map merged over the inherited one —
//! local wins — built once when the interface's configuration is bound
//! (4.G, "The registry composes per-interface effective tables once, at
//! configuration binding").
use std::collections::HashMap;

use super::setup::SetupPacket;
use crate::error::UsbResult;

pub type HandlerFn = Box<dyn FnMut(&SetupPacket) -> UsbResult<Option<Vec<u8>>>>;

/// A named mutator consulted after a handler returns, letting a fuzzing
/// layer substitute the response while preserving the handler's identity
/// for logging (the `mutable`-tag contract of §9).
pub type Mutator = Box<dyn FnMut(&str, UsbResult<Option<Vec<u8>>>) -> UsbResult<Option<Vec<u8>>>>;

/// Builds and holds the inherited/local handler maps for one class or
/// vendor interface, and exposes the merged effective table.
#[derive(Default)]
pub struct HandlerRegistry {
    inherited: HashMap<u8, (String, HandlerFn)>,
    local: HashMap<u8, (String, HandlerFn)>,
    mutator: Option<Mutator>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an inherited (parent-class default) handler.
    pub fn inherit(&mut self, request: u8, name: &str, handler: HandlerFn) -> &mut Self {
        self.inherited.insert(request, (name.to_string(), handler));
        self
    }

    /// Register a local (subclass override) handler. Wins over any
    /// inherited handler for the same request number.
    pub fn set_local(&mut self, request: u8, name: &str, handler: HandlerFn) -> &mut Self {
        self.local.insert(request, (name.to_string(), handler));
        self
    }

    /// Register the same handler factory across an inclusive request-number
    /// range — the "range-fill" pattern used by the Wi-Fi/Bluetooth vendor
    /// stubs to answer every vendor request with `handle_unknown`.
    pub fn fill_range<F>(&mut self, range: std::ops::RangeInclusive<u8>, name: &str, mut make: F) -> &mut Self
    where
        F: FnMut() -> HandlerFn,
    {
        for request in range {
            self.local.insert(request, (name.to_string(), make()));
        }
        self
    }

    pub fn with_mutator(&mut self, mutator: Mutator) -> &mut Self {
        self.mutator = Some(mutator);
        self
    }

    /// Look up and invoke the effective handler for `request`: local first,
    /// inherited second, per property 2 ("Handler override precedence").
    /// Returns `None` if no handler matched either table (dispatcher turns
    /// this into a STALL).
    pub fn dispatch(&mut self, request: u8, setup: &SetupPacket) -> Option<UsbResult<Option<Vec<u8>>>> {
        self.dispatch_named(request, setup).map(|(_, result)| result)
    }

    /// Same lookup as [`Self::dispatch`], but also returns the name of the
    /// handler that answered, so a caller can tell which handler (as
    /// opposed to merely whether one) produced a given response.
    pub fn dispatch_named(&mut self, request: u8, setup: &SetupPacket) -> Option<(String, UsbResult<Option<Vec<u8>>>)> {
        let found = if let Some((name, handler)) = self.local.get_mut(&request) {
            Some((name.clone(), handler(setup)))
        } else {
            self.inherited
                .get_mut(&request)
                .map(|(name, handler)| (name.clone(), handler(setup)))
        };
        let (name, result) = found?;
        let result = match self.mutator.as_mut() {
            Some(mutator) => mutator(&name, result),
            None => result,
        };
        Some((name, result))
    }

    pub fn has_handler(&self, request: u8) -> bool {
        self.local.contains_key(&request) || self.inherited.contains_key(&request)
    }
}

/// The identity mutator: returns the handler's result unchanged. This is
/// the default consulted by every registry until a fuzzing layer installs
/// a real substitution.
pub fn identity_mutator() -> Mutator {
    Box::new(|_name, result| result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_handler_overrides_inherited_for_same_request() {
        let mut reg = HandlerRegistry::new();
        reg.inherit(0x01, "base", Box::new(|_s| Ok(Some(vec![1]))));
        reg.set_local(0x01, "override", Box::new(|_s| Ok(Some(vec![2]))));

        let setup = sample_setup();
        let result = reg.dispatch(0x01, &setup).unwrap().unwrap();
        assert_eq!(result, Some(vec![2]));
    }

    #[test]
    fn inherited_handler_used_when_no_local_override() {
        let mut reg = HandlerRegistry::new();
        reg.inherit(0x01, "base", Box::new(|_s| Ok(Some(vec![9]))));

        let setup = sample_setup();
        let result = reg.dispatch(0x01, &setup).unwrap().unwrap();
        assert_eq!(result, Some(vec![9]));
    }

    #[test]
    fn unmatched_request_returns_none() {
        let mut reg = HandlerRegistry::new();
        let setup = sample_setup();
        assert!(reg.dispatch(0x42, &setup).is_none());
    }

    #[test]
    fn range_fill_covers_every_request_in_range() {
        let mut reg = HandlerRegistry::new();
        reg.fill_range(0x00..=0xff, "handle_unknown", || Box::new(|_s| Ok(Some(vec![]))));
        assert!(reg.has_handler(0x00));
        assert!(reg.has_handler(0x80));
        assert!(reg.has_handler(0xff));
    }

    #[test]
    fn mutator_can_substitute_return_value_but_sees_handler_name() {
        let mut reg = HandlerRegistry::new();
        reg.inherit(0x01, "base", Box::new(|_s| Ok(Some(vec![1]))));
        reg.with_mutator(Box::new(|name, _result| {
            assert_eq!(name, "base");
            Ok(Some(vec![0xaa]))
        }));
        let setup = sample_setup();
        let result = reg.dispatch(0x01, &setup).unwrap().unwrap();
        assert_eq!(result, Some(vec![0xaa]));
    }

    fn sample_setup() -> SetupPacket {
        SetupPacket {
            bm_request_type: 0x21,
            b_request: 0x01,
            w_value: 0,
            w_index: 0,
            w_length: 0,
            data: None,
        }
    }
}
