//! Integration tests for the crawl schema: edge merging, visited flags,
//! frontier selection and hydration candidates against a real Neo4j.
//!
//! Requirements: Docker (for Neo4j via testcontainers)
//!
//! Run with: cargo test -p followcrawl-graph --features test-utils --test graph_store_test

#![cfg(feature = "test-utils")]

use followcrawl_common::UserProfile;
use followcrawl_graph::{query, GraphClient, GraphReader, GraphWriter};

async fn setup() -> (impl std::any::Any, GraphClient) {
    followcrawl_graph::testutil::migrated_store().await
}

async fn count(client: &GraphClient, cypher: &str) -> i64 {
    let mut stream = client
        .inner()
        .execute(query(cypher))
        .await
        .expect("count query failed");
    let row = stream
        .next()
        .await
        .expect("stream failed")
        .expect("count returned no row");
    row.get::<i64>("n").expect("count column")
}

#[tokio::test]
async fn merging_the_same_edge_twice_leaves_one_edge_and_two_nodes() {
    let (_container, client) = setup().await;
    let writer = GraphWriter::new(client.clone());

    writer.merge_follows(1, &[2]).await.unwrap();
    writer.merge_follows(1, &[2]).await.unwrap();

    assert_eq!(count(&client, "MATCH (u:User) RETURN count(u) AS n").await, 2);
    assert_eq!(
        count(&client, "MATCH (:User {id: 1})-[r:FOLLOWS]->(:User {id: 2}) RETURN count(r) AS n").await,
        1
    );
}

#[tokio::test]
async fn migrations_are_idempotent() {
    let (_container, client) = setup().await;
    followcrawl_graph::migrate::migrate(&client)
        .await
        .expect("second migration run failed");
}

#[tokio::test]
async fn frontier_picks_unexpanded_two_hop_nodes_only() {
    let (_container, client) = setup().await;
    let writer = GraphWriter::new(client.clone());
    let reader = GraphReader::new(client.clone());

    // root -> 10 -> {20, 21}; 21 is already expanded, 20 is not.
    writer.merge_follows(100, &[10]).await.unwrap();
    writer.merge_follows(10, &[20, 21]).await.unwrap();
    writer.merge_follows(21, &[30]).await.unwrap();

    assert_eq!(reader.frontier_candidate(100).await.unwrap(), Some(20));

    writer.mark_visited(20).await.unwrap();
    assert_eq!(reader.frontier_candidate(100).await.unwrap(), None);
}

#[tokio::test]
async fn frontier_breaks_ties_on_highest_id() {
    let (_container, client) = setup().await;
    let writer = GraphWriter::new(client.clone());
    let reader = GraphReader::new(client);

    writer.merge_follows(100, &[10, 11]).await.unwrap();
    writer.merge_follows(10, &[20, 40]).await.unwrap();
    writer.merge_follows(11, &[30]).await.unwrap();

    assert_eq!(reader.frontier_candidate(100).await.unwrap(), Some(40));
}

#[tokio::test]
async fn frontier_ignores_other_roots() {
    let (_container, client) = setup().await;
    let writer = GraphWriter::new(client.clone());
    let reader = GraphReader::new(client);

    writer.merge_follows(1, &[2, 3]).await.unwrap();
    writer.merge_follows(2, &[4]).await.unwrap();

    assert_eq!(reader.frontier_candidate(999).await.unwrap(), None);
}

#[tokio::test]
async fn mark_visited_creates_missing_node_and_sticks() {
    let (_container, client) = setup().await;
    let writer = GraphWriter::new(client.clone());

    writer.mark_visited(77).await.unwrap();
    writer.mark_visited(77).await.unwrap();

    assert_eq!(
        count(&client, "MATCH (u:User {id: 77}) WHERE u.visited = true RETURN count(u) AS n").await,
        1
    );
}

#[tokio::test]
async fn hydrated_nodes_drop_out_of_the_candidate_set() {
    let (_container, client) = setup().await;
    let writer = GraphWriter::new(client.clone());
    let reader = GraphReader::new(client.clone());

    writer.merge_follows(1, &[2, 3]).await.unwrap();

    let mut missing = reader.users_missing_profile(99).await.unwrap();
    missing.sort();
    assert_eq!(missing, vec![1, 2, 3]);

    writer
        .upsert_profile(&UserProfile {
            id: 2,
            screen_name: "two".into(),
            name: "Two".into(),
            description: String::new(),
        })
        .await
        .unwrap();

    let mut missing = reader.users_missing_profile(99).await.unwrap();
    missing.sort();
    assert_eq!(missing, vec![1, 3]);
}

#[tokio::test]
async fn candidate_batch_is_capped() {
    let (_container, client) = setup().await;
    let writer = GraphWriter::new(client.clone());
    let reader = GraphReader::new(client);

    let friends: Vec<u64> = (2..=150).collect();
    writer.merge_follows(1, &friends).await.unwrap();

    assert_eq!(reader.users_missing_profile(99).await.unwrap().len(), 99);
}

#[tokio::test]
async fn repeatedly_missed_nodes_sort_behind_fresh_ones() {
    let (_container, client) = setup().await;
    let writer = GraphWriter::new(client.clone());
    let reader = GraphReader::new(client);

    writer.merge_follows(1, &[2, 3]).await.unwrap();
    writer.record_profile_misses(&[1, 2]).await.unwrap();
    writer.record_profile_misses(&[1]).await.unwrap();

    assert_eq!(reader.users_missing_profile(99).await.unwrap(), vec![3, 2, 1]);
    assert_eq!(reader.users_missing_profile(1).await.unwrap(), vec![3]);
}
