use std::hint::black_box;
use std::sync::Arc;

use criterion::{criterion_group, criterion_main, Criterion};
use tmdm::construct::TopicId;
use tmdm::index::Index;
use tmdm::system::TopicMapSystemFactory;
use tmdm::{Locator, TopicMap};
use tracing_subscriber::EnvFilter;

fn topic_map() -> TopicMap {
    let mut system = TopicMapSystemFactory::new().new_topic_map_system();
    let address = Locator::new("http://example.org/bench/").unwrap();
    let shared = system.create_topic_map(&address).unwrap();
    drop(system);
    Arc::try_unwrap(shared).unwrap().into_inner().unwrap()
}

// n instances spread over ten types, each with a name and an occurrence
fn populated(n: u64) -> (TopicMap, Vec<TopicId>) {
    let mut map = topic_map();
    let types: Vec<TopicId> = (0..10).map(|_| map.create_topic().unwrap()).collect();
    let note = map.create_topic().unwrap();
    for i in 0..n {
        let sid = Locator::new(&format!("http://example.org/topic/{}", i)).unwrap();
        let topic = map.create_topic_by_subject_identifier(&sid).unwrap();
        map.add_type(topic, types[(i % 10) as usize]).unwrap();
        map.create_name(topic, &format!("Topic {}", i), &[]).unwrap();
        map.create_occurrence(topic, note, &i.to_string(), &[]).unwrap();
    }
    (map, types)
}

pub fn criterion_benchmark(c: &mut Criterion) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();
    c.bench_function("create 1k topics", |b| {
        b.iter(|| {
            let mut map = topic_map();
            for _ in 0..1000 {
                black_box(map.create_topic().unwrap());
            }
        })
    });
    c.bench_function("populate 1k topics", |b| b.iter(|| black_box(populated(1000))));

    let (map, types) = populated(10_000);
    let sid = Locator::new("http://example.org/topic/5000").unwrap();
    c.bench_function("subject identifier lookup 10k", |b| {
        b.iter(|| black_box(map.topic_by_subject_identifier(&sid)))
    });
    c.bench_function("type-instance index 10k", |b| {
        b.iter(|| black_box(map.type_instance_index().unwrap()))
    });
    let index = map.type_instance_index().unwrap();
    c.bench_function("topics of any type 10k", |b| {
        b.iter(|| black_box(index.topics_of_types(&types[..5], false).unwrap()))
    });
    c.bench_function("literal index 10k", |b| {
        b.iter(|| {
            let index = map.literal_index().unwrap();
            black_box(index.names("Topic 5000").unwrap())
        })
    });

    c.bench_function("merge 100 topic pairs", |b| {
        b.iter(|| {
            let (mut map, _) = populated(200);
            let topics: Vec<TopicId> = map.topics().iter().copied().collect();
            for pair in topics.chunks(2).take(100) {
                if let [target, other] = pair {
                    map.merge_in(*target, *other).unwrap();
                }
            }
            black_box(map)
        })
    });

    let (source, _) = populated(1000);
    c.bench_function("merge a 1k topic map", |b| {
        b.iter(|| {
            let mut target = topic_map();
            target.merge_topic_map(&source).unwrap();
            black_box(target)
        })
    });
    let mut reindexed = index.clone();
    c.bench_function("reindex 10k", |b| b.iter(|| reindexed.reindex(&map).unwrap()));
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
