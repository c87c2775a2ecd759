//! WebSocket connection handlers.
//!
//! 受信したテキストフレームを [`InboundMessage`] に変換し、イベントごとのユースケースに振り分ける。
//! 1 つの接続のフレームは受信順に 1 件ずつ処理し、分類サービスの呼び出しだけを別タスクに逃がす。

use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use tokio::sync::mpsc;

use crate::{
    domain::{ConnectionId, RelayKind, SnapshotFrame},
    infrastructure::dto::websocket::InboundMessage,
    ui::state::AppState,
    usecase::Submission,
};

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Spawns a task that receives messages from the rx channel and pushes them to the WebSocket sender.
///
/// # Arguments
///
/// * `rx` - Channel receiver for events addressed to this connection
/// * `sender` - WebSocket sink to send messages to this client
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: futures_util::stream::SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    })
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (sender, mut receiver) = socket.split();

    let (tx, rx) = mpsc::unbounded_channel();
    let connection_id = state.connect_usecase.execute(tx).await;

    let state_clone = state.clone();
    let connection_id_clone = connection_id.clone();

    // Spawn a task to receive events from this client
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::error!("WebSocket error on '{}': {}", connection_id_clone, e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    dispatch_text(&state_clone, &connection_id_clone, text.as_str()).await;
                }
                Message::Ping(_) => {
                    tracing::debug!("Received ping");
                }
                Message::Close(_) => {
                    tracing::info!("Connection '{}' requested close", connection_id_clone);
                    break;
                }
                _ => {}
            }
        }
    });

    // Spawn a task to push events addressed to this connection
    let mut send_task = pusher_loop(rx, sender);

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    state.disconnect_usecase.execute(&connection_id).await;
}

/// 1 フレーム分のテキストを解釈して処理する。解釈できないフレームは無視する
async fn dispatch_text(state: &Arc<AppState>, connection_id: &ConnectionId, text: &str) {
    match serde_json::from_str::<InboundMessage>(text) {
        Ok(message) => dispatch(state, connection_id, message).await,
        Err(e) => tracing::warn!("Ignoring unparseable frame from '{}': {}", connection_id, e),
    }
}

async fn dispatch(state: &Arc<AppState>, connection_id: &ConnectionId, message: InboundMessage) {
    match message {
        InboundMessage::TeacherJoin { class_id } => {
            if let Err(e) = state
                .teacher_join_usecase
                .execute(connection_id, class_id)
                .await
            {
                tracing::warn!("teacher_join from '{}' rejected: {}", connection_id, e);
            }
        }
        InboundMessage::JoinClass {
            student_id,
            name,
            class_id,
        } => {
            match state
                .student_join_usecase
                .execute(connection_id, student_id, name, class_id)
                .await
            {
                Ok(joined) if !joined.replay.is_empty() => {
                    let pipeline = state.snapshot_pipeline.clone();
                    let connection_id = connection_id.clone();
                    tokio::spawn(async move {
                        pipeline.replay(&connection_id, joined.replay).await;
                    });
                }
                Ok(_) => {}
                Err(e) => tracing::warn!("join_class from '{}' rejected: {}", connection_id, e),
            }
        }
        InboundMessage::StartDetection { class_id } => set_detection(state, class_id, true).await,
        InboundMessage::StopDetection { class_id } => set_detection(state, class_id, false).await,
        InboundMessage::CameraState {
            student_id,
            name,
            class_id,
            enabled,
        } => {
            if let Err(e) = state
                .relay_usecase
                .camera_state(student_id, name, class_id, enabled.as_ref())
                .await
            {
                tracing::debug!("camera_state dropped: {}", e);
            }
        }
        InboundMessage::VideoStream { image } => {
            if let Err(e) = state.relay_usecase.video_stream(connection_id, image).await {
                tracing::debug!("video_stream from '{}' dropped: {}", connection_id, e);
            }
        }
        InboundMessage::Snapshot {
            image,
            student_id,
            name,
            class_id,
        } => {
            let frame = SnapshotFrame::from_parts(image, student_id, name, class_id);
            submit_snapshot(state, connection_id, frame).await;
        }
        InboundMessage::RaiseHand(payload) => {
            relay(state, RelayKind::RaiseHand, payload.into_payload()).await
        }
        InboundMessage::LowerHand(payload) => {
            relay(state, RelayKind::LowerHand, payload.into_payload()).await
        }
        InboundMessage::AskDoubt(payload) => {
            relay(state, RelayKind::AskDoubt, payload.into_payload()).await
        }
        InboundMessage::TeacherVideo { class_id, image } => {
            if let Err(e) = state.relay_usecase.teacher_video(class_id, image).await {
                tracing::debug!("teacher_video dropped: {}", e);
            }
        }
        InboundMessage::TeacherVideoStopped { class_id } => {
            if let Err(e) = state.relay_usecase.teacher_video_stopped(class_id).await {
                tracing::debug!("teacher_video_stopped dropped: {}", e);
            }
        }
    }
}

async fn set_detection(state: &Arc<AppState>, class_id: Option<String>, enabled: bool) {
    if let Err(e) = state
        .set_detection_usecase
        .execute(class_id, enabled)
        .await
    {
        tracing::warn!("Detection toggle ignored: {}", e);
    }
}

async fn relay(state: &Arc<AppState>, kind: RelayKind, payload: serde_json::Map<String, serde_json::Value>) {
    if let Err(e) = state.relay_usecase.relay(kind, payload).await {
        tracing::debug!("Relay event dropped: {}", e);
    }
}

/// 受付判定はこのタスクで行い、分類サービスの呼び出しは別タスクで待つ
async fn submit_snapshot(state: &Arc<AppState>, connection_id: &ConnectionId, frame: SnapshotFrame) {
    match state.snapshot_pipeline.admit(connection_id, frame).await {
        Ok(Submission::Admitted(admitted)) => {
            let pipeline = state.snapshot_pipeline.clone();
            tokio::spawn(async move {
                // 結果の通知と ack はパイプライン側で行う
                let _ = pipeline.process(admitted).await;
            });
        }
        Ok(Submission::Buffered) => {
            tracing::debug!("Buffered snapshot from '{}' until join", connection_id);
        }
        // 送信元には ack で通知済み
        Err(_) => {}
    }
}
