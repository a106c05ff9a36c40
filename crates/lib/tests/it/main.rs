/*! Integration tests for purrcafe.
 *
 * This test suite is organized as a single integration test binary
 * following the pattern described by matklad in
 * https://matklad.github.io/2021/02/27/delete-cargo-integration-tests.html
 *
 * The module structure mirrors the main library structure:
 * - meowid: Identifier codecs and the generator service
 * - backend: Statement execution, transactions and persistence for each backend
 * - store: Lock discipline, reserved rows and concurrent access
 * - user: User accounts, login and cascade deletion
 * - session: Sessions and their expiry
 * - file: Uploads, quotas and self-deleting downloads
 */

use tracing_subscriber::EnvFilter;

#[ctor::ctor]
fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("purrcafe=info".parse().unwrap()),
        )
        .with_test_writer()
        .try_init();
}

mod backend;
mod file;
mod helpers;
mod meowid;
mod session;
mod store;
mod user;
