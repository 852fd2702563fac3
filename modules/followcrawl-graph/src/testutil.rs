//! Disposable Neo4j for the store integration tests.

use testcontainers::{
    core::{ContainerPort, WaitFor},
    runners::AsyncRunner,
    ContainerAsync, GenericImage, ImageExt,
};

use crate::GraphClient;

const IMAGE_TAG: &str = "5.25.1-community";
const BOLT_PORT: u16 = 7687;
const PASSWORD: &str = "followcrawl-test";

/// Start a throwaway Neo4j and connect a `GraphClient` to it.
///
/// Keep the returned handle bound for the whole test; dropping it stops the server.
pub async fn neo4j_container() -> (ContainerAsync<GenericImage>, GraphClient) {
    let container = GenericImage::new("neo4j", IMAGE_TAG)
        .with_exposed_port(ContainerPort::Tcp(BOLT_PORT))
        .with_wait_for(WaitFor::message_on_stdout("Started."))
        .with_env_var("NEO4J_AUTH", format!("neo4j/{PASSWORD}"))
        .start()
        .await
        .expect("neo4j container did not start");

    let port = container
        .get_host_port_ipv4(BOLT_PORT)
        .await
        .expect("bolt port not mapped");

    let client = GraphClient::connect(&format!("bolt://127.0.0.1:{port}"), "neo4j", PASSWORD)
        .await
        .expect("bolt connect failed");

    (container, client)
}

/// Same as [`neo4j_container`], with the crawl schema already applied.
pub async fn migrated_store() -> (ContainerAsync<GenericImage>, GraphClient) {
    let (container, client) = neo4j_container().await;
    crate::migrate::migrate(&client)
        .await
        .expect("schema migration failed");
    (container, client)
}
