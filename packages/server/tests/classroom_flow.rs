//! End-to-end tests: a real server on an ephemeral port, a fake classifier service,
//! and browser-like WebSocket clients.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum::{Json, Router, http::StatusCode, routing::post};
use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

use classmood_server::{
    infrastructure::{
        classifier::HttpEmotionClassifier,
        emotion_log::DisabledEmotionLog,
        message_pusher::WebSocketMessagePusher,
        repository::{InMemoryAggregateRepository, InMemorySessionRepository},
    },
    ui::{AppState, Server},
    usecase::PipelineConfig,
};
use classmood_shared::time::SystemClock;

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Answers "happy" with a percentage confidence, except for two scripted images:
/// `status-500` gets an internal error and `rejected` gets `success: false`.
async fn start_fake_classifier() -> SocketAddr {
    async fn analyze(Json(request): Json<Value>) -> (StatusCode, Json<Value>) {
        match request["image"].as_str() {
            Some("status-500") => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "model crashed"})),
            ),
            Some("rejected") => (
                StatusCode::OK,
                Json(json!({"success": false, "error": "no face model loaded"})),
            ),
            _ => (
                StatusCode::OK,
                Json(json!({
                    "success": true,
                    "emotion": "Happy",
                    "confidence": 92.0,
                    "box": {"x": 1, "y": 2, "w": 3, "h": 4},
                    "source": "fake-model",
                    "studentId": request["studentId"],
                })),
            ),
        }
    }

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = Router::new().route("/analyze", post(analyze));
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

async fn start_server() -> SocketAddr {
    let classifier_addr = start_fake_classifier().await;
    start_server_with(format!("http://{}/analyze", classifier_addr)).await
}

async fn start_server_with(classifier_url: String) -> SocketAddr {
    let state = AppState::new(
        Arc::new(InMemorySessionRepository::default()),
        Arc::new(InMemoryAggregateRepository::default()),
        Arc::new(WebSocketMessagePusher::default()),
        Arc::new(HttpEmotionClassifier::new(classifier_url)),
        Arc::new(DisabledEmotionLog),
        Arc::new(SystemClock),
        PipelineConfig {
            classifier_timeout: Duration::from_secs(5),
            ..Default::default()
        },
    );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(Server::new(state).serve(listener));
    addr
}

async fn connect(addr: SocketAddr) -> Socket {
    let (socket, _) = connect_async(format!("ws://{}/ws", addr)).await.unwrap();
    socket
}

async fn send(socket: &mut Socket, message: Value) {
    socket
        .send(Message::text(message.to_string()))
        .await
        .unwrap();
}

/// Next text frame as JSON (fails the test after 5 seconds)
async fn recv(socket: &mut Socket) -> Value {
    loop {
        let message = tokio::time::timeout(Duration::from_secs(5), socket.next())
            .await
            .expect("timed out waiting for a frame")
            .expect("socket closed")
            .unwrap();
        if let Message::Text(text) = message {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}

async fn get_json(addr: SocketAddr, path: &str) -> Value {
    reqwest::get(format!("http://{}{}", addr, path))
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

#[tokio::test]
async fn test_classroom_session_end_to_end() {
    // テスト項目: 教師の join から分類・集計・切断までが一連で動く
    // given (前提条件): 教師がクラスを開いている
    let addr = start_server().await;
    let mut teacher = connect(addr).await;
    send(&mut teacher, json!({"type": "teacher_join", "classId": "math"})).await;
    let ack = recv(&mut teacher).await;
    assert_eq!(ack["type"], "teacher_join_ack");
    assert_eq!(ack["status"], "ok");
    assert_eq!(ack["roster"], json!([]));

    // when (操作): 生徒が join する
    let mut student = connect(addr).await;
    send(
        &mut student,
        json!({"type": "join_class", "studentId": "s1", "name": "Alice", "classId": "math"}),
    )
    .await;

    // then (期待する結果): ルーム全体に student_joined、生徒には join_ack
    assert_eq!(recv(&mut teacher).await["type"], "student_joined");
    assert_eq!(recv(&mut student).await["type"], "student_joined");
    let join_ack = recv(&mut student).await;
    assert_eq!(join_ack["type"], "join_ack");
    assert_eq!(join_ack["status"], "ok");

    // when (操作): 生徒がスナップショットを送る
    send(
        &mut student,
        json!({"type": "snapshot", "image": "data:image/jpeg;base64,AAAA"}),
    )
    .await;

    // then (期待する結果): 分類結果がルームに配信され、送信元には ok
    let update = recv(&mut teacher).await;
    assert_eq!(update["type"], "emotion_update");
    assert_eq!(update["studentId"], "s1");
    assert_eq!(update["emotion"], "happy");
    assert_eq!(update["engagement"], 85);
    assert_eq!(update["source"], "fake-model");
    assert_eq!(update["box"]["w"], 3);
    assert_eq!(recv(&mut student).await["type"], "emotion_update");
    assert_eq!(
        recv(&mut student).await,
        json!({"type": "snapshot_ack", "status": "ok"})
    );

    // then (期待する結果): レポート API に反映される
    let summary = get_json(addr, "/api/class/math/summary").await;
    assert_eq!(summary["success"], true);
    assert_eq!(summary["summary"]["s1"]["totalSamples"], 1);
    assert_eq!(summary["summary"]["s1"]["dominantEmotion"], "happy");
    assert_eq!(summary["summary"]["s1"]["avgEngagement"], 85.0);
    let roster = get_json(addr, "/api/class/math/roster").await;
    assert_eq!(roster["roster"][0]["studentId"], "s1");
    let check = get_json(addr, "/api/class/math/check").await;
    assert_eq!(check, json!({"success": true, "exists": true, "classId": "math"}));

    // when (操作): 生徒が切断する
    student.close(None).await.unwrap();

    // then (期待する結果):
    let left = recv(&mut teacher).await;
    assert_eq!(left, json!({"type": "student_left", "studentId": "s1", "name": "Alice"}));
}

#[tokio::test]
async fn test_frames_before_join_are_replayed() {
    // テスト項目: join 前のフレームがバッファされ、join 後に分類される
    // given (前提条件):
    let addr = start_server().await;
    let mut teacher = connect(addr).await;
    send(&mut teacher, json!({"type": "teacher_join", "classId": "art"})).await;
    recv(&mut teacher).await;
    let mut student = connect(addr).await;

    // when (操作): join 前にスナップショットを送ってから join
    send(&mut student, json!({"type": "snapshot", "image": "early"})).await;
    assert_eq!(
        recv(&mut student).await,
        json!({"type": "snapshot_ack", "status": "queued_before_join"})
    );
    send(
        &mut student,
        json!({"type": "join_class", "studentId": "s7", "name": "Kai", "classId": "art"}),
    )
    .await;

    // then (期待する結果):
    assert_eq!(recv(&mut teacher).await["type"], "student_joined");
    let update = recv(&mut teacher).await;
    assert_eq!(update["type"], "emotion_update");
    assert_eq!(update["studentId"], "s7");
    let summary = get_json(addr, "/api/class/art/summary").await;
    assert_eq!(summary["summary"]["s7"]["totalSamples"], 1);
}

#[tokio::test]
async fn test_join_unknown_class_and_health() {
    // テスト項目: 存在しないクラスへの join が拒否され、ヘルスチェックは応答する
    // given (前提条件):
    let addr = start_server().await;
    let mut student = connect(addr).await;

    // when (操作):
    send(
        &mut student,
        json!({"type": "join_class", "studentId": "s1", "classId": "nowhere"}),
    )
    .await;

    // then (期待する結果):
    let ack = recv(&mut student).await;
    assert_eq!(ack["status"], "error");
    assert_eq!(ack["reason"], "class_not_found");
    let health = get_json(addr, "/api/health").await;
    assert_eq!(health["success"], true);
    assert!(health["ts"].as_i64().unwrap() > 0);
    let check = get_json(addr, "/api/class/nowhere/check").await;
    assert_eq!(check["exists"], false);
}

/// Opens `class_id` as a teacher and joins `student_id` to it. Returns (teacher, student).
async fn open_class(addr: SocketAddr, class_id: &str, student_id: &str) -> (Socket, Socket) {
    let mut teacher = connect(addr).await;
    send(&mut teacher, json!({"type": "teacher_join", "classId": class_id})).await;
    recv(&mut teacher).await;
    let mut student = connect(addr).await;
    send(
        &mut student,
        json!({"type": "join_class", "studentId": student_id, "name": "Mia", "classId": class_id}),
    )
    .await;
    assert_eq!(recv(&mut teacher).await["type"], "student_joined");
    assert_eq!(recv(&mut student).await["type"], "student_joined");
    assert_eq!(recv(&mut student).await["status"], "ok");
    (teacher, student)
}

#[tokio::test]
async fn test_classifier_failures_are_acked_and_release_the_student() {
    // テスト項目: 分類サービスの 500 応答と success:false はエラー ack になり、集計も配信もされない
    // given (前提条件):
    let addr = start_server().await;
    let (mut teacher, mut student) = open_class(addr, "bio", "s3").await;

    // when (操作): 500 を返すフレーム
    send(&mut student, json!({"type": "snapshot", "image": "status-500"})).await;

    // then (期待する結果):
    let ack = recv(&mut student).await;
    assert_eq!(ack["type"], "snapshot_ack");
    assert_eq!(ack["status"], "error");
    assert!(
        ack["reason"]
            .as_str()
            .unwrap()
            .starts_with("classifier transport error: status 500")
    );

    // when (操作): success:false を返すフレーム
    send(&mut student, json!({"type": "snapshot", "image": "rejected"})).await;

    // then (期待する結果):
    assert_eq!(
        recv(&mut student).await,
        json!({
            "type": "snapshot_ack",
            "status": "error",
            "reason": "classifier rejected the frame: no face model loaded"
        })
    );
    let summary = get_json(addr, "/api/class/bio/summary").await;
    assert_eq!(summary["summary"], json!({}));

    // when (操作): 同じ生徒の次のフレームは受け付けられる
    send(&mut student, json!({"type": "snapshot", "image": "ok"})).await;

    // then (期待する結果): 教師に届く次のフレームがこの分類結果（失敗分の配信は無い）
    let update = recv(&mut teacher).await;
    assert_eq!(update["type"], "emotion_update");
    assert_eq!(update["studentId"], "s3");
    assert_eq!(recv(&mut student).await["type"], "emotion_update");
    assert_eq!(
        recv(&mut student).await,
        json!({"type": "snapshot_ack", "status": "ok"})
    );
    let summary = get_json(addr, "/api/class/bio/summary").await;
    assert_eq!(summary["summary"]["s3"]["totalSamples"], 1);
}

#[tokio::test]
async fn test_unreachable_classifier_is_a_transport_error() {
    // テスト項目: 分類サービスに接続できない場合は transport エラーの ack になる
    // given (前提条件): 閉じたポートを分類サービスの URL にする
    let closed = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let closed_addr = closed.local_addr().unwrap();
    drop(closed);
    let addr = start_server_with(format!("http://{}/analyze", closed_addr)).await;
    let (_teacher, mut student) = open_class(addr, "geo", "s4").await;

    // when (操作):
    send(&mut student, json!({"type": "snapshot", "image": "img"})).await;

    // then (期待する結果):
    let ack = recv(&mut student).await;
    assert_eq!(ack["status"], "error");
    assert!(
        ack["reason"]
            .as_str()
            .unwrap()
            .starts_with("classifier transport error")
    );
}
