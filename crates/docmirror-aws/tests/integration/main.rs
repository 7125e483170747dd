//! Integration tests for docmirror-aws
//!
//! Uses wiremock to stand in for the content URLs, the S3 REST API and the
//! WorkDocs REST API, and drives the adapters through their port traits
//! and through the reconciliation engine.


mod test_engine;
mod test_fetch;
mod test_workdocs;
