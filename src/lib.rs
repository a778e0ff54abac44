//! The library code for `rants`, a headless renderer for a small blog whose
//! posts live in a single JSON document. The architecture breaks down into
//! three layers:
//!
//! 1. Loading documents through a [`source::Source`] and holding them in an
//!    [`state::AppState`]
//! 2. Routing a URL fragment ([`route`]) to one of the [`view`]s, which render
//!    post bodies with the [`markup`] transformer
//! 3. Driving the above as a page [`session`] and filling a page template with
//!    the result ([`write`], [`build`])
//!
//! A session starts three independent loads (the posts and one document per
//! [`stats`] widget) and renders immediately, before any of them resolve. When
//! the posts arrive the current route is rendered again, exactly once; stats
//! widgets are filled in place as they arrive, and a widget whose document
//! fails to load simply stays empty.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod build;
pub mod config;
pub mod markup;
pub mod post;
pub mod route;
pub mod session;
pub mod source;
pub mod state;
pub mod stats;
pub mod view;
pub mod write;
