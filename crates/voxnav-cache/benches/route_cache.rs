use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tokio::sync::broadcast;
use voxnav_cache::{RouteCache, RouteCacheConfig};
use voxnav_core::{Block, BlockUpdate, BlockWorld, BoundingBox, VoxelPos};

struct FlatWorld {
    updates: broadcast::Sender<BlockUpdate>,
}

impl BlockWorld for FlatWorld {
    fn block_at(&self, pos: VoxelPos) -> Option<Block> {
        let (id, name, bb) = if pos.y < 64 {
            (1, "stone", BoundingBox::Block)
        } else {
            (0, "air", BoundingBox::Empty)
        };
        Some(Block::new(id, name, bb, pos))
    }

    fn subscribe(&self) -> broadcast::Receiver<BlockUpdate> {
        self.updates.subscribe()
    }
}

fn route(start: VoxelPos, len: i32) -> Vec<VoxelPos> {
    (0..len).map(|dz| start.offset(0, 0, dz)).collect()
}

fn bench_route_cache(c: &mut Criterion) {
    let (updates, _) = broadcast::channel(1024);
    let world = Arc::new(FlatWorld { updates });
    let mut cache = RouteCache::new(RouteCacheConfig::default(), world);

    let starts: Vec<VoxelPos> = (0..100).map(|i| VoxelPos::new(i * 10, 64, 0)).collect();
    for start in &starts {
        cache.put(*start, start.offset(0, 0, 199), route(*start, 200), 1.0);
    }

    let mut group = c.benchmark_group("voxnav-cache/route_cache");

    group.bench_function("get_hit", |b| {
        let mut i = 0usize;
        b.iter(|| {
            let start = starts[i % starts.len()];
            i += 1;
            let hit = cache.get(start, start.offset(0, 0, 199)).is_some();
            black_box(hit);
        })
    });

    group.bench_function("put_evicting", |b| {
        let mut i = 0i32;
        b.iter(|| {
            let start = VoxelPos::new(5_000 + i * 10, 64, 0);
            i += 1;
            black_box(cache.put(start, start.offset(0, 0, 199), route(start, 200), 1.0));
        })
    });

    group.bench_function("invalidate_near_miss", |b| {
        b.iter(|| black_box(cache.invalidate_near(VoxelPos::new(-500, 64, -500), 3.0)))
    });

    group.finish();
}

criterion_group!(benches, bench_route_cache);
criterion_main!(benches);
