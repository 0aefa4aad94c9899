// FAE Tools - Post-Issuance Software Toolkit
// Copyright (C) 2026 FAE Tools Team
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Sample post-issuance application: picks one of two functions through a
//! global function pointer and reports where a few objects live in memory.

use std::fmt;
use std::sync::{Mutex, PoisonError};
use tracing::debug;

pub type FuncPtr = fn() -> i32;

pub fn func_a() -> i32 {
    23
}

pub fn func_b() -> i32 {
    32
}

/// Target called by [`call_selected`]. Starts out as [`func_a`].
pub static FUNC_PTR: Mutex<FuncPtr> = Mutex::new(func_a);

pub static CST: i32 = 3;

pub const GREETING: &str = "hello world !";

pub fn assign(target: FuncPtr) {
    *FUNC_PTR.lock().unwrap_or_else(PoisonError::into_inner) = target;
}

pub fn selected() -> FuncPtr {
    *FUNC_PTR.lock().unwrap_or_else(PoisonError::into_inner)
}

pub fn call_selected() -> i32 {
    selected()()
}

/// Switches the pointer to [`func_b`] when any argument was given, then
/// calls through it.
pub fn dispatch(arg_count: usize) -> i32 {
    if arg_count > 0 {
        debug!("{} argument(s), reassigning to func_b", arg_count);
        assign(func_b);
    }
    let v = call_selected();
    debug!("Selected function returned {}", v);
    v
}

/// Addresses printed by the demo, captured once so every line refers to
/// the same objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Addresses {
    pub string: *const u8,
    pub string_slot: *const &'static str,
    pub main: *const (),
    pub cst: *const i32,
}

impl Addresses {
    pub fn capture(string: &&'static str, main: *const ()) -> Self {
        Self {
            string: string.as_ptr(),
            string_slot: string as *const &'static str,
            main,
            cst: &CST as *const i32,
        }
    }

    pub fn all_non_null(&self) -> bool {
        !self.string.is_null()
            && !self.string_slot.is_null()
            && !self.main.is_null()
            && !self.cst.is_null()
    }
}

impl fmt::Display for Addresses {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "@string = {:p}", self.string)?;
        writeln!(f, "@&string = {:p}", self.string_slot)?;
        writeln!(f, "@&main = {:p}", self.main)?;
        writeln!(f, "&cst = {:p}", self.cst)?;
        writeln!(f, "cst = {}", CST)
    }
}
