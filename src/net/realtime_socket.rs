//! Browser websocket driver for [`ChannelState`].
//!
//! One spawned task owns the websocket. Outbound frames go through an
//! unbounded channel shared by every connection attempt; frames queued for a
//! dead connection are dropped when the next one opens so nothing stale is
//! replayed after a reconnect.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use futures::channel::mpsc;
use futures::{FutureExt, SinkExt, StreamExt};
use gloo_net::websocket::Message;
use gloo_net::websocket::futures::WebSocket;

use super::{Backoff, ChannelAction, ChannelState, ConnectionStatus, MessageChannel, socket_endpoint};
use crate::config::{ClientConfig, ReconnectPolicy};
use crate::error::ChannelError;
use crate::net::types::WireMessage;
use crate::state::session::Session;

type MessageListener = Rc<dyn Fn(WireMessage)>;
type StatusListener = Rc<dyn Fn(ConnectionStatus)>;

struct Shared {
    state: ChannelState,
    tx: mpsc::UnboundedSender<String>,
    message_listeners: Vec<MessageListener>,
    status_listeners: Vec<StatusListener>,
    rejection: Option<String>,
}

/// Live realtime connection for one room. Dropping the handle disconnects.
pub struct RealtimeHandle {
    shared: Rc<RefCell<Shared>>,
}

impl RealtimeHandle {
    /// Open the socket for `session` and start the reconnect loop.
    pub fn connect(config: &ClientConfig, session: &Session) -> Self {
        let (tx, rx) = mpsc::unbounded::<String>();
        let shared = Rc::new(RefCell::new(Shared {
            state: ChannelState::new(&session.token),
            tx,
            message_listeners: Vec::new(),
            status_listeners: Vec::new(),
            rejection: None,
        }));
        let encoded_token = String::from(js_sys::encode_uri_component(&session.token));
        let url = socket_endpoint(&config.socket_base_url, &encoded_token);
        leptos::task::spawn_local(channel_loop(url, config.reconnect, Rc::clone(&shared), rx));
        Self { shared }
    }

    /// Join `chat_id`, now or as soon as the handshake completes.
    ///
    /// # Errors
    ///
    /// [`ChannelError::NotConnected`] means the join is deferred, not lost.
    pub fn join_room(&self, chat_id: &str) -> Result<(), ChannelError> {
        let frame = self.shared.borrow_mut().state.join_room(chat_id)?;
        self.push(frame)
    }

    pub fn on_message(&self, listener: impl Fn(WireMessage) + 'static) {
        self.shared.borrow_mut().message_listeners.push(Rc::new(listener));
    }

    pub fn on_status(&self, listener: impl Fn(ConnectionStatus) + 'static) {
        self.shared.borrow_mut().status_listeners.push(Rc::new(listener));
    }

    /// Reason given by the server when it refused the connection.
    pub fn rejection(&self) -> Option<String> {
        self.shared.borrow().rejection.clone()
    }

    /// Close the socket and stop reconnecting. Idempotent.
    pub fn disconnect(&self) {
        let mut shared = self.shared.borrow_mut();
        if shared.state.close() {
            shared.tx.close_channel();
            shared.message_listeners.clear();
            shared.status_listeners.clear();
            log::info!("realtime channel disconnected");
        }
    }

    fn push(&self, frame: String) -> Result<(), ChannelError> {
        self.shared.borrow().tx.unbounded_send(frame).map_err(|_| ChannelError::Closed)
    }
}

impl MessageChannel for RealtimeHandle {
    fn status(&self) -> ConnectionStatus {
        self.shared.borrow().state.status()
    }

    fn send_message(&self, chat_id: &str, text: &str) -> Result<(), ChannelError> {
        let frame = self.shared.borrow().state.send_message(chat_id, text)?;
        self.push(frame)
    }
}

impl Drop for RealtimeHandle {
    fn drop(&mut self) {
        self.disconnect();
    }
}

/// Execute actions with no `RefCell` borrow held, so listeners may call
/// back into the handle.
fn run_actions(shared: &Rc<RefCell<Shared>>, actions: Vec<ChannelAction>) {
    for action in actions {
        match action {
            ChannelAction::Send(frame) => {
                let tx = shared.borrow().tx.clone();
                if tx.unbounded_send(frame).is_err() {
                    log::debug!("realtime outbound queue closed");
                }
            }
            ChannelAction::Deliver(message) => {
                let listeners = shared.borrow().message_listeners.clone();
                for listener in listeners {
                    listener(message.clone());
                }
            }
            ChannelAction::Status(status) => {
                log::debug!("realtime status {status:?}");
                let listeners = shared.borrow().status_listeners.clone();
                for listener in listeners {
                    listener(status);
                }
            }
            ChannelAction::Rejected(reason) => {
                log::warn!("realtime connection rejected: {reason}");
                shared.borrow_mut().rejection = Some(reason);
            }
        }
    }
}

/// Connection loop with reconnect logic.
async fn channel_loop(
    url: String,
    policy: ReconnectPolicy,
    shared: Rc<RefCell<Shared>>,
    mut rx: mpsc::UnboundedReceiver<String>,
) {
    let mut backoff = Backoff::new(policy);

    loop {
        let opening = shared.borrow_mut().state.on_transport_opening();
        run_actions(&shared, opening);

        if let Err(e) = connect_and_run(&url, &shared, &mut rx).await {
            log::warn!("realtime socket error: {e}");
        }

        if shared.borrow_mut().state.take_established() {
            backoff.reset();
        }
        let (closed, status) = {
            let s = shared.borrow();
            (s.state.is_closed(), s.state.status())
        };
        if closed || status == ConnectionStatus::Failed {
            break;
        }

        let dropped = shared.borrow_mut().state.on_transport_closed();
        run_actions(&shared, dropped);

        let Some(delay_ms) = backoff.next_delay_ms() else {
            log::warn!("realtime reconnect gave up after {} attempts", backoff.attempts());
            let failed = shared.borrow_mut().state.mark_failed();
            run_actions(&shared, failed);
            break;
        };
        log::info!("realtime reconnect in {delay_ms}ms");
        gloo_timers::future::sleep(Duration::from_millis(u64::from(delay_ms))).await;

        if shared.borrow().state.is_closed() {
            break;
        }
    }

    log::debug!("realtime channel loop finished");
}

/// Connect to the websocket and pump frames until either side stops.
async fn connect_and_run(
    url: &str,
    shared: &Rc<RefCell<Shared>>,
    rx: &mut mpsc::UnboundedReceiver<String>,
) -> Result<(), String> {
    let ws = WebSocket::open(url).map_err(|e| e.to_string())?;
    let (mut ws_write, mut ws_read) = ws.split();

    while let Some(Some(stale)) = rx.next().now_or_never() {
        log::debug!("dropping frame queued for previous connection: {stale}");
    }

    let send_task = async {
        while let Some(frame) = rx.next().await {
            if ws_write.send(Message::Text(frame)).await.is_err() {
                break;
            }
        }
        let _ = ws_write.close().await;
    };

    let recv_task = async {
        while let Some(msg) = ws_read.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    let result = shared.borrow_mut().state.handle_incoming(&text);
                    match result {
                        Ok(actions) => run_actions(shared, actions),
                        Err(e) => log::warn!("dropping realtime frame: {e}"),
                    }
                }
                Ok(Message::Bytes(_)) => log::debug!("ignoring binary realtime frame"),
                Err(e) => {
                    log::warn!("realtime recv error: {e}");
                    break;
                }
            }
        }
    };

    futures::future::select(Box::pin(send_task), Box::pin(recv_task)).await;
    Ok(())
}
