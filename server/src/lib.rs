// Life of a search request:
// 1. JSON filter comes in with a bearer token
// 2. Verify the token into a security context
// 3. Check the filter tree against the configured limits
// 4. Compile:
//     - Security scope (libraries, content restrictions)
//     - User filter, one leaf at a time, collecting required joins
//     - AND the two together
// 5. Hand the compiled filter to a backend (SQL renderer, in-memory store)
//
// System components:
//  - Filter AST and operator families
//  - Filter compiler and predicate IR
//  - Backends

pub mod auth;
pub mod backend;
pub mod config;
pub mod http;
pub mod search;
pub mod time;
pub mod types;

mod e2e_tests;
