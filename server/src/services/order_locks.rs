// server/src/services/order_locks.rs

//! In-process try-locks keyed by order id.

use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;

pub const ORDER_BUSY: &str = "订单正在处理中，请稍后再试";

#[derive(Default)]
pub struct OrderLocks {
  held: Mutex<HashSet<i64>>,
}

/// Releases the order when dropped.
pub struct OrderLockGuard {
  locks: Arc<OrderLocks>,
  order_id: i64,
}

impl OrderLocks {
  /// `None` when another request is already working on the order.
  pub fn try_acquire(self: &Arc<Self>, order_id: i64) -> Option<OrderLockGuard> {
    if !self.held.lock().insert(order_id) {
      return None;
    }
    Some(OrderLockGuard {
      locks: Arc::clone(self),
      order_id,
    })
  }

  pub fn is_held(&self, order_id: i64) -> bool {
    self.held.lock().contains(&order_id)
  }
}

impl Drop for OrderLockGuard {
  fn drop(&mut self) {
    self.locks.held.lock().remove(&self.order_id);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn one_holder_per_order() {
    let locks = Arc::new(OrderLocks::default());
    let first = locks.try_acquire(10).expect("free");
    assert!(locks.try_acquire(10).is_none());
    assert!(locks.try_acquire(11).is_some());
    drop(first);
    assert!(!locks.is_held(10));
    assert!(locks.try_acquire(10).is_some());
  }

  #[tokio::test]
  async fn contended_grab_has_a_single_winner() {
    let locks = Arc::new(OrderLocks::default());
    let mut tasks = Vec::new();
    for _ in 0..8 {
      let locks = Arc::clone(&locks);
      tasks.push(tokio::spawn(async move {
        let guard = locks.try_acquire(99);
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        guard.is_some()
      }));
    }
    let mut winners = 0;
    for task in tasks {
      if task.await.unwrap() {
        winners += 1;
      }
    }
    assert_eq!(winners, 1);
  }
}
