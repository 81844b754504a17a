//! 라우팅 정책
//!
//! 서버 선택 전략을 정의합니다.
//!
//! 전략은 주소 목록을 보관하지 않습니다. 호출할 때마다 현재 라우팅 테이블의
//! 후보 목록을 받아 그 중 하나를 고르며, 역할(읽기/쓰기)마다 독립된 인덱스를
//! 유지합니다. 토폴로지가 바뀌어도 인덱스는 초기화하지 않고 새 길이에 대해
//! 계속 순환합니다.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use super::super::driver::ServerAddress;

/// 라우팅 정책
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RoutingPolicy {
    /// 라운드 로빈 (기본값)
    #[default]
    RoundRobin,
    /// 최소 연결
    LeastConnected,
}

impl RoutingPolicy {
    /// 정책에 맞는 전략 생성
    ///
    /// `RoundRobin`은 카운터를 사용하지 않습니다.
    pub fn into_strategy(self, counter: Arc<ConnectionCounter>) -> Box<dyn LoadBalancingStrategy> {
        match self {
            RoutingPolicy::RoundRobin => Box::new(RoundRobinStrategy::new()),
            RoutingPolicy::LeastConnected => Box::new(LeastConnectedStrategy::new(counter)),
        }
    }
}

// ============================================================================
// RoundRobinIndex - 라운드 로빈 인덱스
// ============================================================================

/// 스레드 간 공유되는 라운드 로빈 인덱스
///
/// `next(len)`은 `0, 1, .., len - 1, 0, 1, ..` 순서로 인덱스를 돌려줍니다.
/// 카운터가 `usize::MAX`에 도달하면 0으로 감깁니다.
#[derive(Debug, Default)]
pub struct RoundRobinIndex {
    offset: AtomicUsize,
}

impl RoundRobinIndex {
    /// 새 인덱스 생성
    pub fn new() -> Self {
        Self::with_offset(0)
    }

    /// 지정한 위치에서 시작하는 인덱스 생성
    pub fn with_offset(offset: usize) -> Self {
        Self {
            offset: AtomicUsize::new(offset),
        }
    }

    /// 다음 인덱스
    ///
    /// `len`은 0보다 커야 합니다. 빈 목록은 호출하는 쪽에서 걸러야 합니다.
    pub fn next(&self, len: usize) -> usize {
        debug_assert!(len > 0, "round robin index requires a non-empty array");
        // fetch_add 는 오버플로 시 감김
        self.offset.fetch_add(1, Ordering::Relaxed) % len
    }
}

// ============================================================================
// LoadBalancingStrategy - 서버 선택 전략
// ============================================================================

/// 서버 선택 전략
pub trait LoadBalancingStrategy: Send + Sync {
    /// 읽기 서버 선택 (후보가 없으면 `None`)
    fn select_reader<'a>(&self, known_readers: &'a [ServerAddress]) -> Option<&'a ServerAddress>;

    /// 쓰기 서버 선택 (후보가 없으면 `None`)
    fn select_writer<'a>(&self, known_writers: &'a [ServerAddress]) -> Option<&'a ServerAddress>;
}

/// 라운드 로빈 전략
///
/// 읽기와 쓰기에 대해 서로 독립된 인덱스를 유지합니다.
#[derive(Debug, Default)]
pub struct RoundRobinStrategy {
    readers_index: RoundRobinIndex,
    writers_index: RoundRobinIndex,
}

impl RoundRobinStrategy {
    /// 새 전략 생성
    pub fn new() -> Self {
        Self::default()
    }

    fn select<'a>(
        addresses: &'a [ServerAddress],
        index: &RoundRobinIndex,
    ) -> Option<&'a ServerAddress> {
        if addresses.is_empty() {
            return None;
        }
        addresses.get(index.next(addresses.len()))
    }
}

impl LoadBalancingStrategy for RoundRobinStrategy {
    fn select_reader<'a>(&self, known_readers: &'a [ServerAddress]) -> Option<&'a ServerAddress> {
        Self::select(known_readers, &self.readers_index)
    }

    fn select_writer<'a>(&self, known_writers: &'a [ServerAddress]) -> Option<&'a ServerAddress> {
        Self::select(known_writers, &self.writers_index)
    }
}

// ============================================================================
// ConnectionCounter - 서버별 연결 카운터
// ============================================================================

/// 서버별 사용 중 연결 카운터
#[derive(Debug, Default)]
pub struct ConnectionCounter {
    counts: RwLock<HashMap<ServerAddress, usize>>,
}

impl ConnectionCounter {
    /// 새 카운터 생성
    pub fn new() -> Self {
        Self::default()
    }

    /// 연결 획득 시 카운트 증가
    pub fn acquire(&self, server: &ServerAddress) {
        let mut counts = self.counts.write();
        *counts.entry(server.clone()).or_insert(0) += 1;
    }

    /// 연결 해제 시 카운트 감소
    pub fn release(&self, server: &ServerAddress) {
        let mut counts = self.counts.write();
        if let Some(count) = counts.get_mut(server) {
            *count = count.saturating_sub(1);
        }
    }

    /// 특정 서버의 연결 수 조회
    pub fn in_use(&self, server: &ServerAddress) -> usize {
        self.counts.read().get(server).copied().unwrap_or(0)
    }
}

/// 최소 연결 전략
///
/// 라운드 로빈 위치에서 탐색을 시작해 사용 중 연결이 가장 적은 서버를
/// 고릅니다. 부하가 같으면 먼저 탐색된 서버가 선택되므로 라운드 로빈과
/// 같은 순서가 됩니다.
pub struct LeastConnectedStrategy {
    readers_index: RoundRobinIndex,
    writers_index: RoundRobinIndex,
    counter: Arc<ConnectionCounter>,
}

impl LeastConnectedStrategy {
    /// 새 전략 생성
    pub fn new(counter: Arc<ConnectionCounter>) -> Self {
        Self {
            readers_index: RoundRobinIndex::new(),
            writers_index: RoundRobinIndex::new(),
            counter,
        }
    }

    fn select<'a>(
        &self,
        addresses: &'a [ServerAddress],
        index: &RoundRobinIndex,
    ) -> Option<&'a ServerAddress> {
        let size = addresses.len();
        if size == 0 {
            return None;
        }

        let start = index.next(size);
        let mut least: Option<(&'a ServerAddress, usize)> = None;
        for i in 0..size {
            let address = &addresses[(start + i) % size];
            let in_use = self.counter.in_use(address);
            if least.map_or(true, |(_, min)| in_use < min) {
                least = Some((address, in_use));
            }
        }
        least.map(|(address, _)| address)
    }
}

impl LoadBalancingStrategy for LeastConnectedStrategy {
    fn select_reader<'a>(&self, known_readers: &'a [ServerAddress]) -> Option<&'a ServerAddress> {
        self.select(known_readers, &self.readers_index)
    }

    fn select_writer<'a>(&self, known_writers: &'a [ServerAddress]) -> Option<&'a ServerAddress> {
        self.select(known_writers, &self.writers_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::thread;

    fn servers(names: &[&str]) -> Vec<ServerAddress> {
        names.iter().map(|n| ServerAddress::new(*n, 7687)).collect()
    }

    fn hosts(selected: Vec<&ServerAddress>) -> Vec<&str> {
        selected.into_iter().map(|a| a.host.as_str()).collect()
    }

    #[test]
    fn test_round_robin_index_rotation() {
        let index = RoundRobinIndex::new();
        let seq: Vec<usize> = (0..7).map(|_| index.next(3)).collect();
        assert_eq!(seq, vec![0, 1, 2, 0, 1, 2, 0]);
    }

    #[test]
    fn test_round_robin_index_wraparound() {
        let index = RoundRobinIndex::with_offset(usize::MAX);

        // usize::MAX % 3 == 0, 이후 0 으로 감김
        assert_eq!(index.next(3), 0);
        assert_eq!(index.next(3), 0);
        assert_eq!(index.next(3), 1);
        assert_eq!(index.next(3), 2);
    }

    #[test]
    fn test_round_robin_index_concurrent() {
        let index = Arc::new(RoundRobinIndex::new());
        let len = 1 << 20;

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let index = Arc::clone(&index);
                thread::spawn(move || (0..1000).map(|_| index.next(len)).collect::<Vec<_>>())
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for i in handle.join().unwrap() {
                assert!(seen.insert(i), "duplicated index {}", i);
            }
        }
        // 유실/중복 없이 0..8000 이 모두 나와야 함
        assert_eq!(seen.len(), 8000);
        assert!((0..8000).all(|i| seen.contains(&i)));
    }

    #[test]
    fn test_round_robin_select_reader() {
        let strategy = RoundRobinStrategy::new();
        let readers = servers(&["a", "b", "c"]);

        let selected: Vec<_> = (0..7).map(|_| strategy.select_reader(&readers).unwrap()).collect();
        assert_eq!(hosts(selected), vec!["a", "b", "c", "a", "b", "c", "a"]);
    }

    #[test]
    fn test_round_robin_fair_distribution() {
        let strategy = RoundRobinStrategy::new();
        let readers = servers(&["a", "b", "c", "d"]);

        let mut counts: HashMap<String, usize> = HashMap::new();
        for _ in 0..10 {
            let s = strategy.select_reader(&readers).unwrap();
            *counts.entry(s.host.clone()).or_default() += 1;
        }
        // floor(10/4) = 2, ceil(10/4) = 3
        assert!(counts.values().all(|&c| c == 2 || c == 3));
        assert_eq!(counts.values().sum::<usize>(), 10);
    }

    #[test]
    fn test_round_robin_empty() {
        let strategy = RoundRobinStrategy::new();
        assert!(strategy.select_reader(&[]).is_none());
        assert!(strategy.select_writer(&[]).is_none());

        // 빈 목록 선택은 인덱스를 움직이지 않음
        let writers = servers(&["w1", "w2"]);
        assert_eq!(strategy.select_writer(&writers).unwrap().host, "w1");
    }

    #[test]
    fn test_round_robin_roles_independent() {
        let strategy = RoundRobinStrategy::new();
        let readers = servers(&["r1", "r2", "r3"]);
        let writers = servers(&["w1", "w2"]);

        for _ in 0..5 {
            strategy.select_reader(&readers);
        }
        assert_eq!(strategy.select_writer(&writers).unwrap().host, "w1");
        assert_eq!(strategy.select_writer(&writers).unwrap().host, "w2");

        // 읽기 쪽은 5번 진행한 위치에서 계속
        assert_eq!(strategy.select_reader(&readers).unwrap().host, "r3");
    }

    #[test]
    fn test_round_robin_topology_change_keeps_rotating() {
        let strategy = RoundRobinStrategy::new();
        let before = servers(&["a", "b", "c"]);
        let after = servers(&["a", "b"]);

        assert_eq!(strategy.select_reader(&before).unwrap().host, "a");
        assert_eq!(strategy.select_reader(&before).unwrap().host, "b");
        assert_eq!(strategy.select_reader(&before).unwrap().host, "c");

        // 카운터는 초기화되지 않음: 3 % 2 == 1
        assert_eq!(strategy.select_reader(&after).unwrap().host, "b");
        assert_eq!(strategy.select_reader(&after).unwrap().host, "a");
    }

    #[test]
    fn test_connection_counter() {
        let counter = ConnectionCounter::new();
        let server = ServerAddress::new("server1", 7687);

        assert_eq!(counter.in_use(&server), 0);
        counter.acquire(&server);
        counter.acquire(&server);
        assert_eq!(counter.in_use(&server), 2);

        counter.release(&server);
        counter.release(&server);
        counter.release(&server);
        assert_eq!(counter.in_use(&server), 0);
    }

    #[test]
    fn test_least_connected_selection() {
        let counter = Arc::new(ConnectionCounter::new());
        let strategy = LeastConnectedStrategy::new(Arc::clone(&counter));
        let readers = servers(&["a", "b", "c"]);

        counter.acquire(&readers[0]);
        counter.acquire(&readers[0]);
        counter.acquire(&readers[1]);

        assert_eq!(strategy.select_reader(&readers).unwrap().host, "c");

        for _ in 0..3 {
            counter.acquire(&readers[2]);
        }
        assert_eq!(strategy.select_reader(&readers).unwrap().host, "b");
    }

    #[test]
    fn test_least_connected_ties_rotate() {
        let strategy = LeastConnectedStrategy::new(Arc::new(ConnectionCounter::new()));
        let writers = servers(&["w1", "w2", "w3"]);

        let selected: Vec<_> = (0..4).map(|_| strategy.select_writer(&writers).unwrap()).collect();
        assert_eq!(hosts(selected), vec!["w1", "w2", "w3", "w1"]);
        assert!(strategy.select_reader(&[]).is_none());
    }

    #[test]
    fn test_policy_into_strategy() {
        let counter = Arc::new(ConnectionCounter::new());
        let readers = servers(&["a", "b"]);

        let strategy = RoutingPolicy::default().into_strategy(Arc::clone(&counter));
        assert_eq!(strategy.select_reader(&readers).unwrap().host, "a");

        counter.acquire(&readers[0]);
        let strategy = RoutingPolicy::LeastConnected.into_strategy(counter);
        assert_eq!(strategy.select_reader(&readers).unwrap().host, "b");
    }
}
