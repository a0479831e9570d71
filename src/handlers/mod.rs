// Handlers are grouped by whether they need an authenticated caller:
// public (anonymous allowed) and protected (bearer token required).
pub mod protected;
pub mod public;
