//! Interactive periodic table backend with Usha, an element-aware chemistry assistant.

// Interdiction stricte de pratiques dangereuses ou non idiomatiques
#![deny(unsafe_code)] // Le code unsafe est interdit
#![warn(missing_docs)] // Toute fonction, struct, enum ou module public doit être documenté
#![deny(non_camel_case_types)]
#![deny(unused_must_use)] // Oblige à gérer explicitement les Result et Option
#![deny(nonstandard_style)] // Empêche tout style de code non standard
#![forbid(unsafe_op_in_unsafe_fn)]

// Clippy pour stricte discipline
#![deny(clippy::all)] // Active toutes les lints Clippy standard
#![warn(clippy::pedantic)] // Active les lints très strictes de Clippy
#![deny(clippy::unwrap_used)] // Interdit unwrap()
#![deny(clippy::expect_used)] // Interdit expect()
#![deny(clippy::panic)] // Interdit panic!()
#![deny(clippy::print_stdout)] // Interdit println!() en production
#![deny(clippy::todo)] // Interdit les TODO dans le code
#![deny(clippy::unimplemented)] // Interdit les fonctions non implémentées
#![deny(clippy::unwrap_in_result)] // Interdit unwrap() sur Result
#![deny(clippy::redundant_clone)] // Interdit les clones inutiles
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

/// Element catalog, records and filters.
pub mod catalog;
/// Usha chat: prompts, upstream client, sessions.
pub mod chat;
/// Runtime configuration.
pub mod config;
/// Table layout and popup positioning.
pub mod layout;
/// HTTP server and API routes.
#[allow(clippy::missing_errors_doc, clippy::unused_async)]
pub mod server;
/// Entry helpers to start the Usha server.
pub mod start_usha;
