//! Shared socket state.
//!
//! `SocketCore` is the part of a socket that peers can reach: transports
//! push inbound frames into it from whatever thread they run on, while the
//! owning [`Socket`](crate::socket::Socket) handle drives sends, receives and
//! option changes.
//!
//! # Locking
//!
//! All mutable state sits behind one mutex. A core never calls into a
//! [`PeerLink`] while holding its own lock, so two sockets sending to each
//! other at the same time cannot deadlock: sends snapshot the links they need,
//! release the lock, deliver, then re-lock to commit pattern state.
//!
//! # Inbound queues
//!
//! Each peer has its own queue of *complete* messages, bounded by `recv_hwm`.
//! Frames are assembled per peer and only a finished message is queued, so a
//! receiver can never observe part of a message. Receives fair-queue across
//! peers; a message is admitted only if the pattern accepts it (SUB
//! subscriptions, REQ correlation, REP envelope).

use bytes::Bytes;
use parking_lot::Mutex;
use plinth_core::error::{PlinthError, Result};
use plinth_core::frame::Frame;
use plinth_core::message::{Message, MessageAssembler};
use plinth_core::monitor::{create_monitor, SocketEvent, SocketEventSender, SocketMonitor};
use plinth_core::options::{OverflowPolicy, SocketOption, SocketOptions};
use plinth_core::socket_type::SocketType;
use plinth_core::subscription::SubscriptionSet;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

use crate::flags::PollFlags;
use crate::pattern::{Pattern, RecvSource, RepState, Route};
use crate::signal::ReadySignal;
use crate::transport::{Delivery, PeerKey, PeerLink, PeerOrigin};

/// Context-unique socket identifier.
pub type SocketId = u64;

/// One attached connection.
struct Peer {
    key: PeerKey,
    routing_id: Bytes,
    link: Arc<dyn PeerLink>,
    assembler: MessageAssembler,
    inbound: VecDeque<Message>,
    /// Skipping the remaining frames of a message that broke a limit.
    discarding: bool,
    /// Gone, but still holding messages the application may read.
    detached: bool,
}

struct CoreState {
    options: SocketOptions,
    pattern: Pattern,
    peers: Vec<Peer>,
    /// Messages accepted by a load-balancing send while no peer could be reached.
    outbound: VecDeque<Message>,
    subscriptions: SubscriptionSet,
    rr_cursor: usize,
    fq_cursor: usize,
    inbound_len: usize,
    next_generated_id: u32,
    closed: bool,
    monitor: Option<SocketEventSender>,
}

impl CoreState {
    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            Err(PlinthError::ClosedResource)
        } else {
            Ok(())
        }
    }

    fn emit(&mut self, event: SocketEvent) {
        if let Some(tx) = &self.monitor {
            if tx.send(event).is_err() {
                self.monitor = None;
            }
        }
    }

    fn peer_index(&self, key: PeerKey) -> Option<usize> {
        self.peers.iter().position(|p| p.key == key)
    }

    fn active_peers(&self) -> impl Iterator<Item = &Peer> {
        self.peers.iter().filter(|p| !p.detached)
    }

    fn routing_id_in_use(&self, id: &Bytes) -> bool {
        self.active_peers().any(|p| &p.routing_id == id)
    }

    /// `[0x00, counter (u32 BE)]`; a leading zero byte marks generated ids.
    fn generate_routing_id(&mut self) -> Bytes {
        loop {
            let mut id = [0u8; 5];
            id[1..].copy_from_slice(&self.next_generated_id.to_be_bytes());
            self.next_generated_id = self.next_generated_id.wrapping_add(1);
            let id = Bytes::copy_from_slice(&id);
            if !self.routing_id_in_use(&id) {
                return id;
            }
        }
    }

    fn round_robin_targets(&self) -> Vec<(PeerKey, Arc<dyn PeerLink>)> {
        let n = self.peers.len();
        (0..n)
            .map(|i| &self.peers[(self.rr_cursor + i) % n])
            .filter(|p| !p.detached)
            .map(|p| (p.key, Arc::clone(&p.link)))
            .collect()
    }

    fn advance_rr(&mut self, key: PeerKey) {
        if let Some(idx) = self.peer_index(key) {
            self.rr_cursor = (idx + 1) % self.peers.len();
        }
    }

    fn link_for(&self, key: PeerKey) -> Option<Arc<dyn PeerLink>> {
        self.active_peers()
            .find(|p| p.key == key)
            .map(|p| Arc::clone(&p.link))
    }

    /// Commit a routed send to the pattern.
    fn commit(&mut self, peer: Option<PeerKey>) {
        self.pattern.commit_send(peer);
        if matches!(self.pattern, Pattern::Req { .. }) {
            // Anything still queued answers an abandoned request.
            self.clear_inbound();
        }
    }

    /// A REQ may only have its newest request in flight; older queued ones
    /// were abandoned by a relaxed resend.
    fn drop_abandoned_requests(&mut self) {
        if matches!(self.pattern, Pattern::Req { .. }) && !self.outbound.is_empty() {
            trace!("[REQ] dropping {} abandoned queued requests", self.outbound.len());
            self.outbound.clear();
        }
    }

    fn clear_inbound(&mut self) {
        for peer in &mut self.peers {
            peer.inbound.clear();
        }
        self.inbound_len = 0;
        self.prune();
    }

    fn has_inbound(&self, source: RecvSource) -> bool {
        match source {
            RecvSource::Any => self.inbound_len > 0,
            RecvSource::Peer(key) => self
                .peer_index(key)
                .is_some_and(|i| !self.peers[i].inbound.is_empty()),
            RecvSource::Nothing => false,
        }
    }

    fn pop_inbound(&mut self, source: RecvSource) -> Option<(PeerKey, Bytes, Message)> {
        let idx = match source {
            RecvSource::Nothing => return None,
            RecvSource::Peer(key) => self
                .peer_index(key)
                .filter(|&i| !self.peers[i].inbound.is_empty())?,
            RecvSource::Any => {
                let n = self.peers.len();
                (0..n)
                    .map(|i| (self.fq_cursor + i) % n)
                    .find(|&i| !self.peers[i].inbound.is_empty())?
            }
        };

        let peer = &mut self.peers[idx];
        let msg = peer.inbound.pop_front()?;
        let popped = (peer.key, peer.routing_id.clone(), msg);
        self.inbound_len -= 1;
        self.fq_cursor = idx + 1;
        self.prune();
        Some(popped)
    }

    /// Drop detached peers that have been drained.
    fn prune(&mut self) {
        self.peers.retain(|p| !(p.detached && p.inbound.is_empty()));
        let n = self.peers.len().max(1);
        self.fq_cursor %= n;
        self.rr_cursor %= n;
    }

    fn accept_frame(&mut self, idx: usize, frame: Frame) -> Delivery {
        let peer = &mut self.peers[idx];
        if peer.discarding {
            peer.discarding = frame.more;
            return Delivery::Dropped;
        }

        let more = frame.more;
        match peer.assembler.push_frame(frame) {
            Ok(None) => Delivery::Pending,
            Ok(Some(msg)) => self.enqueue(idx, msg),
            Err(e) => {
                peer.discarding = more;
                trace!("[{}] inbound message discarded: {}", self.pattern.socket_type(), e);
                Delivery::Dropped
            }
        }
    }

    fn enqueue(&mut self, idx: usize, msg: Message) -> Delivery {
        let socket_type = self.pattern.socket_type();
        let key = self.peers[idx].key;

        if socket_type == SocketType::Sub && !self.subscriptions.matches(msg.first()) {
            return Delivery::Filtered;
        }
        if !self.pattern.admit(key, &msg) {
            trace!("[{}] message from peer {} not admitted", socket_type, key);
            return Delivery::Dropped;
        }

        if self.options.recv_full(self.peers[idx].inbound.len()) {
            if socket_type != SocketType::Sub {
                return Delivery::Full;
            }
            match self.options.overflow {
                OverflowPolicy::DropNewest => {
                    trace!("[SUB] queue full, dropping newest");
                    return Delivery::Dropped;
                }
                OverflowPolicy::DropOldest => {
                    trace!("[SUB] queue full, dropping oldest");
                    if self.peers[idx].inbound.pop_front().is_some() {
                        self.inbound_len -= 1;
                    }
                }
            }
        }

        self.peers[idx].inbound.push_back(msg);
        self.inbound_len += 1;
        Delivery::Queued
    }
}

/// The shared half of a socket.
pub struct SocketCore {
    id: SocketId,
    socket_type: SocketType,
    signal: Arc<ReadySignal>,
    state: Mutex<CoreState>,
}

impl fmt::Debug for SocketCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SocketCore")
            .field("id", &self.id)
            .field("socket_type", &self.socket_type)
            .finish_non_exhaustive()
    }
}

/// Hand `msg` to the first target that takes it.
fn deliver_round_robin(
    msg: &Message,
    targets: &[(PeerKey, Arc<dyn PeerLink>)],
) -> Result<Option<PeerKey>> {
    for (key, link) in targets {
        if link.deliver(msg)?.is_consumed() {
            return Ok(Some(*key));
        }
    }
    Ok(None)
}

impl SocketCore {
    pub(crate) fn new(
        id: SocketId,
        socket_type: SocketType,
        options: SocketOptions,
        signal: Arc<ReadySignal>,
    ) -> Arc<Self> {
        Arc::new(Self {
            id,
            socket_type,
            signal,
            state: Mutex::new(CoreState {
                options,
                pattern: Pattern::new(socket_type),
                peers: Vec::new(),
                outbound: VecDeque::new(),
                subscriptions: SubscriptionSet::new(),
                rr_cursor: 0,
                fq_cursor: 0,
                inbound_len: 0,
                next_generated_id: 1,
                closed: false,
                monitor: None,
            }),
        })
    }

    #[inline]
    pub fn id(&self) -> SocketId {
        self.id
    }

    #[inline]
    pub fn socket_type(&self) -> SocketType {
        self.socket_type
    }

    pub(crate) fn signal(&self) -> &Arc<ReadySignal> {
        &self.signal
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Identity this socket presents to peers, if one was configured.
    pub fn routing_id_hint(&self) -> Option<Bytes> {
        self.state.lock().options.routing_id.clone()
    }

    pub(crate) fn options(&self) -> SocketOptions {
        self.state.lock().options.clone()
    }

    pub(crate) fn emit(&self, event: SocketEvent) {
        self.state.lock().emit(event);
    }

    pub(crate) fn monitor(&self) -> SocketMonitor {
        let (tx, rx) = create_monitor();
        self.state.lock().monitor = Some(tx);
        rx
    }

    /// Attach a connection. Returns the routing identity assigned to the peer.
    ///
    /// The peer's own identity is used when it has one and it is not taken;
    /// otherwise one is generated.
    ///
    /// # Errors
    ///
    /// `ClosedResource` if this socket is closed.
    pub fn attach_peer(
        &self,
        key: PeerKey,
        remote_routing_id: Option<Bytes>,
        link: Arc<dyn PeerLink>,
        origin: PeerOrigin,
    ) -> Result<Bytes> {
        let routing_id = {
            let mut st = self.state.lock();
            st.ensure_open()?;

            let routing_id = match remote_routing_id {
                Some(id) if !st.routing_id_in_use(&id) => id,
                Some(id) => {
                    debug!("[{}] routing id {:?} already in use, generating", self.socket_type, id);
                    st.generate_routing_id()
                }
                None => st.generate_routing_id(),
            };

            let assembler = MessageAssembler::new(
                st.options.max_frames,
                st.options.max_msg_size.unwrap_or(usize::MAX),
            );
            st.peers.push(Peer {
                key,
                routing_id: routing_id.clone(),
                link,
                assembler,
                inbound: VecDeque::new(),
                discarding: false,
                detached: false,
            });

            let event = match origin {
                PeerOrigin::Connected(endpoint) => SocketEvent::Connected(endpoint),
                PeerOrigin::Accepted(endpoint) => SocketEvent::Accepted {
                    endpoint,
                    routing_id: routing_id.clone(),
                },
            };
            st.emit(event);
            routing_id
        };

        debug!(socket = self.id, peer = key, routing_id = ?routing_id, "[{}] peer attached", self.socket_type);
        self.signal.notify();
        Ok(routing_id)
    }

    /// Detach a connection. Messages already queued from it stay readable.
    pub fn detach_peer(&self, key: PeerKey) {
        let detached = {
            let mut st = self.state.lock();
            match st.peer_index(key) {
                Some(idx) if !st.peers[idx].detached => {
                    let peer = &mut st.peers[idx];
                    peer.detached = true;
                    peer.discarding = false;
                    peer.assembler.reset();
                    let routing_id = peer.routing_id.clone();
                    st.emit(SocketEvent::Disconnected { routing_id });
                    st.prune();
                    true
                }
                _ => false,
            }
        };

        if detached {
            debug!(socket = self.id, peer = key, "[{}] peer detached", self.socket_type);
            self.signal.notify();
        }
    }

    /// Feed one inbound frame from `key`.
    ///
    /// Returns [`Delivery::Pending`] until the frame with `more == false`
    /// arrives. Back-pressure is only evaluated when the message completes,
    /// so a transport feeding frames one by one should check
    /// [`SocketCore::has_room`] before starting a message.
    pub fn push_frame(&self, key: PeerKey, frame: Frame) -> Delivery {
        let delivery = {
            let mut st = self.state.lock();
            if st.closed {
                return Delivery::Disconnected;
            }
            let Some(idx) = st.peer_index(key).filter(|&i| !st.peers[i].detached) else {
                return Delivery::Disconnected;
            };
            st.accept_frame(idx, frame)
        };

        if delivery == Delivery::Queued {
            self.signal.notify();
        }
        delivery
    }

    /// Feed a complete inbound message from `key`.
    ///
    /// Unlike frame-by-frame delivery, a full queue is detected up front and
    /// nothing is consumed.
    pub fn push_message(&self, key: PeerKey, msg: &Message) -> Delivery {
        let delivery = {
            let mut st = self.state.lock();
            if st.closed {
                return Delivery::Disconnected;
            }
            let Some(idx) = st.peer_index(key).filter(|&i| !st.peers[i].detached) else {
                return Delivery::Disconnected;
            };
            if self.socket_type != SocketType::Sub
                && st.peers[idx].assembler.is_idle()
                && st.options.recv_full(st.peers[idx].inbound.len())
            {
                return Delivery::Full;
            }

            let mut delivery = Delivery::Pending;
            for frame in msg.frames() {
                delivery = st.accept_frame(idx, frame);
            }
            delivery
        };

        if delivery == Delivery::Queued {
            trace!(socket = self.id, peer = key, frames = msg.len(), "[{}] message queued", self.socket_type);
            self.signal.notify();
        }
        delivery
    }

    /// Could a message from `key` be queued right now?
    pub fn has_room(&self, key: PeerKey) -> bool {
        let st = self.state.lock();
        if st.closed {
            return false;
        }
        st.peer_index(key).is_some_and(|i| {
            self.socket_type == SocketType::Sub || !st.options.recv_full(st.peers[i].inbound.len())
        })
    }

    /// Push queued outbound messages to whichever peers will take them.
    ///
    /// # Errors
    ///
    /// Propagates `TransportFailure` from a link; the message stays queued.
    pub fn flush_outbound(&self) -> Result<()> {
        let mut flushed = 0usize;
        let result = loop {
            let (msg, targets) = {
                let mut st = self.state.lock();
                if st.closed {
                    break Ok(());
                }
                let targets = st.round_robin_targets();
                if targets.is_empty() {
                    break Ok(());
                }
                let Some(msg) = st.outbound.pop_front() else {
                    break Ok(());
                };
                (msg, targets)
            };

            match deliver_round_robin(&msg, &targets) {
                Ok(Some(key)) => {
                    let mut st = self.state.lock();
                    st.advance_rr(key);
                    st.pattern.on_flushed(key, &msg);
                    flushed += 1;
                }
                Ok(None) => {
                    self.state.lock().outbound.push_front(msg);
                    break Ok(());
                }
                Err(e) => {
                    self.state.lock().outbound.push_front(msg);
                    break Err(e);
                }
            }
        };

        if flushed > 0 {
            trace!(socket = self.id, flushed, "[{}] outbound queue flushed", self.socket_type);
            self.signal.notify();
        }
        result
    }

    /// One send attempt. `WouldBlock` means nothing was sent or queued.
    pub(crate) fn send(&self, msg: Message) -> Result<()> {
        let route = {
            let st = self.state.lock();
            st.ensure_open()?;
            st.pattern.route(msg, st.options.req_relaxed)?
        };

        match route {
            Route::FanOut(msg) => {
                self.fan_out(&msg);
                Ok(())
            }
            Route::RoundRobin(msg) => self.send_round_robin(msg),
            Route::Reply(peer, msg) => self.send_reply(peer, &msg),
            Route::Identity(id, msg) => self.send_to_identity(&id, &msg),
        }
    }

    fn fan_out(&self, msg: &Message) {
        let links: Vec<Arc<dyn PeerLink>> = {
            let st = self.state.lock();
            st.active_peers().map(|p| Arc::clone(&p.link)).collect()
        };

        let mut queued = 0usize;
        for link in &links {
            match link.deliver(msg) {
                Ok(Delivery::Queued) => queued += 1,
                Ok(_) => {}
                Err(e) => debug!("[{}] fan-out delivery failed: {}", self.socket_type, e),
            }
        }
        trace!(socket = self.id, queued, peers = links.len(), "[{}] published", self.socket_type);
    }

    fn send_round_robin(&self, msg: Message) -> Result<()> {
        let targets = {
            let mut st = self.state.lock();
            st.drop_abandoned_requests();
            if !st.outbound.is_empty() || st.active_peers().next().is_none() {
                if st.options.send_full(st.outbound.len()) {
                    return Err(PlinthError::WouldBlock);
                }
                st.outbound.push_back(msg);
                st.commit(None);
                drop(st);
                trace!(socket = self.id, "[{}] no peer ready, message queued", self.socket_type);
                self.signal.notify();
                return self.flush_outbound();
            }
            st.round_robin_targets()
        };

        match deliver_round_robin(&msg, &targets)? {
            Some(key) => {
                {
                    let mut st = self.state.lock();
                    st.advance_rr(key);
                    st.commit(Some(key));
                }
                trace!(socket = self.id, peer = key, "[{}] sent {} frames", self.socket_type, msg.len());
                self.signal.notify();
                Ok(())
            }
            None => Err(PlinthError::WouldBlock),
        }
    }

    fn send_reply(&self, peer: PeerKey, msg: &Message) -> Result<()> {
        let link = self.state.lock().link_for(peer);

        let delivery = match link {
            Some(link) => link.deliver(msg)?,
            None => Delivery::Disconnected,
        };
        match delivery {
            Delivery::Full => return Err(PlinthError::WouldBlock),
            Delivery::Disconnected => {
                debug!(socket = self.id, peer, "[{}] requester gone, reply dropped", self.socket_type);
            }
            _ => {}
        }

        self.state.lock().commit(Some(peer));
        self.signal.notify();
        Ok(())
    }

    fn send_to_identity(&self, identity: &Bytes, msg: &Message) -> Result<()> {
        let (link, mandatory) = {
            let st = self.state.lock();
            let link = st
                .active_peers()
                .find(|p| &p.routing_id == identity)
                .map(|p| Arc::clone(&p.link));
            (link, st.options.router_mandatory)
        };

        let Some(link) = link else {
            if mandatory {
                return Err(PlinthError::HostUnreachable);
            }
            trace!("[{}] unknown routing id {:?}, message dropped", self.socket_type, identity);
            return Ok(());
        };

        match link.deliver(msg)? {
            Delivery::Full if mandatory => Err(PlinthError::WouldBlock),
            Delivery::Disconnected if mandatory => Err(PlinthError::HostUnreachable),
            Delivery::Full | Delivery::Disconnected => {
                trace!("[{}] peer {:?} unavailable, message dropped", self.socket_type, identity);
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// One receive attempt. `Ok(None)` means nothing is ready.
    pub(crate) fn try_recv(&self) -> Result<Option<Message>> {
        let received = {
            let mut st = self.state.lock();
            st.ensure_open()?;
            st.pattern.check_recv()?;

            loop {
                let source = st.pattern.recv_source();
                let Some((key, routing_id, msg)) = st.pop_inbound(source) else {
                    break None;
                };
                match st.pattern.on_recv(key, &routing_id, msg) {
                    Some(msg) => break Some((key, msg)),
                    None => trace!("[{}] discarded message from peer {}", self.socket_type, key),
                }
            }
        };

        let Some((key, msg)) = received else {
            return Ok(None);
        };
        trace!(socket = self.id, peer = key, frames = msg.len(), "[{}] received", self.socket_type);
        // Queue shrank and pattern state moved: both can change readiness.
        self.signal.notify();
        Ok(Some(msg))
    }

    /// Current readiness, evaluated against pattern legality.
    pub fn readiness(&self) -> PollFlags {
        enum WriteProbe {
            No,
            Yes,
            Peer(Arc<dyn PeerLink>),
            AnyPeer(Vec<(PeerKey, Arc<dyn PeerLink>)>),
        }

        let (mut flags, probe) = {
            let st = self.state.lock();
            if st.closed {
                return PollFlags::EMPTY;
            }

            let mut flags = PollFlags::EMPTY;
            if st.pattern.check_recv().is_ok() && st.has_inbound(st.pattern.recv_source()) {
                flags |= PollFlags::POLLIN;
            }

            let probe = if st.pattern.check_send(st.options.req_relaxed).is_err() {
                WriteProbe::No
            } else {
                match &st.pattern {
                    Pattern::Pub | Pattern::Router | Pattern::XRep => WriteProbe::Yes,
                    Pattern::Rep {
                        state: RepState::ReadyToReply { peer, .. },
                    } => st.link_for(*peer).map_or(WriteProbe::Yes, WriteProbe::Peer),
                    _ if !st.outbound.is_empty() || st.active_peers().next().is_none() => {
                        if st.options.send_full(st.outbound.len()) {
                            WriteProbe::No
                        } else {
                            WriteProbe::Yes
                        }
                    }
                    _ => WriteProbe::AnyPeer(st.round_robin_targets()),
                }
            };
            (flags, probe)
        };

        let writable = match probe {
            WriteProbe::No => false,
            WriteProbe::Yes => true,
            WriteProbe::Peer(link) => link.has_room(),
            WriteProbe::AnyPeer(targets) => targets.iter().any(|(_, link)| link.has_room()),
        };
        if writable {
            flags |= PollFlags::POLLOUT;
        }
        flags
    }

    pub(crate) fn set_option(&self, option: SocketOption) -> Result<()> {
        let ty = self.socket_type;
        let name = option.name();
        {
            let mut st = self.state.lock();
            st.ensure_open()?;

            match option {
                SocketOption::Subscribe(prefix) if ty == SocketType::Sub => {
                    st.subscriptions.subscribe(prefix);
                }
                SocketOption::Unsubscribe(prefix) if ty == SocketType::Sub => {
                    st.subscriptions.unsubscribe(&prefix);
                }
                SocketOption::RoutingId(id) if id.is_empty() || id.len() > 255 => {
                    return Err(PlinthError::invalid("routing id must be 1-255 bytes"));
                }
                SocketOption::RoutingId(id) => st.options.routing_id = Some(id),
                SocketOption::RecvHwm(hwm) => st.options.recv_hwm = hwm,
                SocketOption::SendHwm(hwm) => st.options.send_hwm = hwm,
                SocketOption::RecvTimeout(t) => st.options.recv_timeout = t,
                SocketOption::SendTimeout(t) => st.options.send_timeout = t,
                SocketOption::RouterMandatory(on)
                    if matches!(ty, SocketType::Router | SocketType::XRep) =>
                {
                    st.options.router_mandatory = on;
                }
                SocketOption::ReqRelaxed(on) if ty == SocketType::Req => {
                    st.options.req_relaxed = on;
                }
                SocketOption::Overflow(policy) => st.options.overflow = policy,
                SocketOption::MaxMsgSize(max) => st.options.max_msg_size = max,
                SocketOption::MaxFrames(0) => {
                    return Err(PlinthError::invalid("frame limit must be at least 1"));
                }
                SocketOption::MaxFrames(frames) => st.options.max_frames = frames,
                SocketOption::Subscribe(_)
                | SocketOption::Unsubscribe(_)
                | SocketOption::RouterMandatory(_)
                | SocketOption::ReqRelaxed(_) => {
                    return Err(PlinthError::invalid(format!(
                        "option {name} is not valid on {ty} sockets"
                    )));
                }
            }
        }

        debug!(socket = self.id, "[{}] option {} set", ty, name);
        // Relaxed/HWM changes can flip writability.
        self.signal.notify();
        Ok(())
    }

    /// Close the socket and tear down every connection.
    pub(crate) fn close(&self) {
        let links: Vec<Arc<dyn PeerLink>> = {
            let mut st = self.state.lock();
            if st.closed {
                return;
            }
            st.closed = true;
            st.outbound.clear();
            st.inbound_len = 0;
            st.emit(SocketEvent::Closed);
            st.monitor = None;
            st.peers.drain(..).map(|p| p.link).collect()
        };

        for link in links {
            link.close();
        }
        debug!(socket = self.id, "[{}] closed", self.socket_type);
        self.signal.notify();
    }
}
