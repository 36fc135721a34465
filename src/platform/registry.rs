//! 平台内部共享的监听器注册表
//!
//! 注册表按能力类别分发事件。每个订阅只注销自己注册时拿到的句柄，
//! 句柄全局唯一且不复用，跨订阅周期不会误删他人的监听器。

use std::sync::Mutex;

use crossbeam_channel::{Sender, TrySendError};
use log::warn;

use crate::platform::Capability;
use crate::types::RawEvent;

/// 监听器句柄。注销时必须回传注册时获得的同一个值。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

struct ListenerEntry {
    id: ListenerId,
    capability: Capability,
    sink: Sender<RawEvent>,
}

struct RegistryInner {
    next_id: u64,
    entries: Vec<ListenerEntry>,
}

/// 线程安全的监听器表，平台后端共用
pub struct ListenerRegistry {
    inner: Mutex<RegistryInner>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(RegistryInner {
                next_id: 1,
                entries: Vec::new(),
            }),
        }
    }

    /// 登记一个监听器并返回其句柄
    pub fn register(&self, capability: Capability, sink: Sender<RawEvent>) -> ListenerId {
        let mut inner = self.inner.lock().unwrap();
        let id = ListenerId(inner.next_id);
        inner.next_id += 1;
        inner.entries.push(ListenerEntry {
            id,
            capability,
            sink,
        });
        id
    }

    /// 注销句柄；返回该句柄是否确实在表中
    pub fn deregister(&self, id: ListenerId) -> bool {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.entries.len();
        inner.entries.retain(|entry| entry.id != id);
        inner.entries.len() != before
    }

    /// 将事件投递给该能力的全部监听器，返回成功投递数
    ///
    /// 监听器缓冲写满时丢弃本条事件并告警，不阻塞投递线程。
    pub fn dispatch(&self, event: RawEvent) -> usize {
        let capability = event.capability();
        let inner = self.inner.lock().unwrap();
        let mut delivered = 0;
        for entry in inner.entries.iter().filter(|e| e.capability == capability) {
            match entry.sink.try_send(event) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    warn!(
                        "listener {:?} buffer full, {} event dropped",
                        entry.id, capability
                    );
                }
                // 订阅端已销毁但尚未注销，静默跳过
                Err(TrySendError::Disconnected(_)) => {}
            }
        }
        delivered
    }

    /// 当前登记的监听器数量
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 当前登记的全部句柄，按注册顺序
    pub fn ids(&self) -> Vec<ListenerId> {
        self.inner
            .lock()
            .unwrap()
            .entries
            .iter()
            .map(|entry| entry.id)
            .collect()
    }
}

impl Default for ListenerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
