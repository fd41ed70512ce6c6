use std::{
  net::{IpAddr, Ipv4Addr, Ipv6Addr},
  sync::Arc,
};

use bt_rust_dht_routing::{
  test, AddNodeOutcome, IpVersion, KeyRange, NodeId, NodeStatus, RoutingTable,
};
use futures_util::future::join_all;
use tokio::task;

use pretty_assertions::assert_eq;

const LOCALHOST_V4: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);
const LOCALHOST_V6: IpAddr = IpAddr::V6(Ipv6Addr::LOCALHOST);

fn init_logger() {
  let _ = pretty_env_logger::try_init();
}

#[track_caller]
fn assert_partition(buckets: &[KeyRange]) {
  assert!(!buckets.is_empty());
  assert_eq!(buckets[0].min(), NodeId::MIN);
  assert_eq!(buckets[buckets.len() - 1].max(), NodeId::MAX);

  for pair in buckets.windows(2) {
    assert_eq!(pair[0].max().checked_increment(), Some(pair[1].min()));
  }
}

fn even_table() -> RoutingTable {
  let table = RoutingTable::builder()
    .set_node_id(test::key(0))
    .set_accept_all(true)
    .build();

  for n in (0..40).step_by(2) {
    let outcome =
      table.add_node(test::key(n), LOCALHOST_V4, 6881, NodeStatus::Good);
    assert_eq!(outcome, AddNodeOutcome::Added);
  }
  table
}

fn closest(table: &RoutingTable, target: u64, count: usize) -> Vec<NodeId> {
  table
    .find_closest_nodes_with_count(&test::key(target), IpVersion::V4, count)
    .iter()
    .map(|n| n.id())
    .collect()
}

fn keys<I: IntoIterator<Item = u64>>(values: I) -> Vec<NodeId> {
  values.into_iter().map(test::key).collect()
}

#[test]
fn closest_nodes_at_the_edges() {
  init_logger();
  let table = even_table();

  assert_eq!(closest(&table, 1, 8), keys((0..16).step_by(2)));
  assert_eq!(closest(&table, 41, 8), keys((24..40).step_by(2)));
}

#[test]
fn closest_nodes_in_the_middle() {
  init_logger();
  let table = even_table();

  // 16 and 18 are 27 and 25 away from 11 by xor, every id below 16 is closer.
  assert_eq!(closest(&table, 11, 8), keys((0..16).step_by(2)));
  assert_eq!(closest(&table, 26, 4), keys([24, 26, 28, 30]));
}

#[test]
fn partition_holds_after_random_inserts() {
  init_logger();
  let table = RoutingTable::new(rand::random());

  for id in test::dummy_block_node_ids(2000) {
    table.add_node(id, LOCALHOST_V4, 6881, NodeStatus::Good);
  }

  let buckets = table.buckets(IpVersion::V4);
  assert_partition(&buckets);
  assert!(buckets.iter().all(|b| b.count() <= b.capacity()));

  let counted: usize = buckets.iter().map(|b| b.count()).sum();
  assert_eq!(counted, table.total_node_count(IpVersion::V4));
}

#[test]
fn partition_holds_in_accept_all_mode() {
  init_logger();
  let table = RoutingTable::builder().set_accept_all(true).build();
  let ids = test::dummy_block_node_ids(500);

  for id in &ids {
    let outcome = table.add_node(*id, LOCALHOST_V6, 6881, NodeStatus::Good);
    assert!(outcome.is_added());
  }

  assert_partition(&table.buckets(IpVersion::V6));
  assert_partition(&table.buckets(IpVersion::V4));
  assert_eq!(table.total_node_count(IpVersion::V6), ids.len());

  let nodes = table.nodes(IpVersion::V6);
  assert!(nodes.windows(2).all(|w| w[0].id() < w[1].id()));
}

#[test]
fn duplicate_inserts_are_idempotent() {
  init_logger();
  let table = RoutingTable::new(test::key(0));
  let ids = test::dummy_block_node_ids(50);

  for id in &ids {
    table.add_node(*id, LOCALHOST_V4, 6881, NodeStatus::Good);
  }
  let before = table.total_node_count(IpVersion::V4);

  for id in &ids {
    let outcome = table.add_node(*id, LOCALHOST_V4, 1, NodeStatus::Unknown);
    assert_ne!(outcome, AddNodeOutcome::Added);
  }

  assert_eq!(table.total_node_count(IpVersion::V4), before);
}

#[test]
fn capacity_ceiling() {
  init_logger();
  let max = 100;
  let table = RoutingTable::builder()
    .set_max_node_count(max)
    .set_accept_all(true)
    .build();
  let ids = test::dummy_block_node_ids(max + 1);
  assert_eq!(ids.len(), max + 1);

  let outcomes: Vec<_> = ids
    .iter()
    .map(|id| table.add_node(*id, LOCALHOST_V4, 6881, NodeStatus::Good))
    .collect();

  assert_eq!(table.total_node_count(IpVersion::V4), table.max_node_count());
  assert_eq!(outcomes[max], AddNodeOutcome::TableFull);
}

#[test]
fn split_keeps_every_node_in_one_bucket() {
  init_logger();
  let self_id: NodeId = rand::random();
  let table = RoutingTable::new(self_id);

  // Nine ids that all land in the first bucket, which holds our id.
  let ids: Vec<NodeId> = (0..9).map(|bit| self_id.flip_bit(bit)).collect();
  for id in &ids {
    let outcome = table.add_node(*id, LOCALHOST_V4, 6881, NodeStatus::Good);
    assert!(outcome.is_added());
  }

  let buckets = table.buckets(IpVersion::V4);
  assert!(buckets.len() >= 2);
  assert_partition(&buckets);

  for id in &ids {
    let owners = buckets.iter().filter(|b| b.is_in_range(id)).count();
    assert_eq!(owners, 1);
  }
}

#[test]
fn clear_forgets_nodes_and_buckets() {
  init_logger();
  let table = even_table();
  table.add_node(test::key(3), LOCALHOST_V6, 6881, NodeStatus::Good);

  table.clear();

  assert_eq!(table.node_count(), 0);
  assert!(table.find_exact_node(&test::key(2), IpVersion::V4).is_none());
  assert_eq!(table.buckets(IpVersion::V4).len(), 1);
  let outcome = table.add_node(test::key(2), LOCALHOST_V4, 1, NodeStatus::Good);
  assert!(outcome.is_added());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_inserts_and_lookups() {
  init_logger();
  let table = Arc::new(
    RoutingTable::builder()
      .set_accept_all(true)
      .set_max_node_count(100_000)
      .build(),
  );

  let writers = (0..4).map(|_| {
    let table = table.clone();
    task::spawn_blocking(move || {
      test::dummy_block_node_ids(500)
        .into_iter()
        .map(|id| table.add_node(id, LOCALHOST_V4, 6881, NodeStatus::Good))
        .filter(AddNodeOutcome::is_added)
        .count()
    })
  });

  let readers = (0..4).map(|_| {
    let table = table.clone();
    task::spawn_blocking(move || {
      for _ in 0..500 {
        let target: NodeId = rand::random();
        let nodes = table.find_closest_nodes(&target, IpVersion::V4);
        assert!(nodes.len() <= 16);
        assert!(nodes.windows(2).all(|w| w[0].id() < w[1].id()));

        if let Some(node) = nodes.first() {
          table.update_node_state(
            &node.id(),
            NodeStatus::Questionable,
            IpVersion::V4,
          );
        }
      }
      0
    })
  });

  let added: usize = join_all(writers.chain(readers))
    .await
    .into_iter()
    .map(|result| result.unwrap())
    .sum();

  assert_eq!(table.total_node_count(IpVersion::V4), added);
  assert_partition(&table.buckets(IpVersion::V4));

  let nodes = table.nodes(IpVersion::V4);
  assert!(nodes.windows(2).all(|w| w[0].id() < w[1].id()));
}
