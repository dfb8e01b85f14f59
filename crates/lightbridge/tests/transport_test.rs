use std::time::Duration;

use lightbridge::Dispatcher;
use lightbridge::MappingTable;
use lightbridge::dispatch::EVENT_QUEUE_CAPACITY;
use lightbridge::dispatch::LightMapping;
use lightbridge::dispatch::event_queue;
use lightbridge::mqtt::MqttConfig;
use lightbridge::mqtt::RumqttcClient;
use tokio::io::AsyncReadExt;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;
use tokio::net::tcp::OwnedReadHalf;
use tokio::sync::mpsc;
use tokio::sync::watch;

const KITCHEN_COMMAND: &str = "hmd/light/MQTT-Lightwave-RF/kitchen/command";
const HALL_COMMAND: &str = "hmd/light/MQTT-Lightwave-RF/hall/command";

/// Single-connection MQTT 3.1.1 broker that acks everything
///
/// Frames sent on `frames` are written to the client. Every packet received
/// from the client is reported on `seen`: "CONNECT", "SUBSCRIBE <filter>",
/// the topic of each PUBLISH, and "DISCONNECT".
struct FakeBroker {
    port: u16,
    frames: mpsc::UnboundedSender<Vec<u8>>,
    seen: mpsc::UnboundedReceiver<String>,
}

impl FakeBroker {
    async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let (frames_tx, mut frames_rx) = mpsc::unbounded_channel::<Vec<u8>>();
        let (seen_tx, seen_rx) = mpsc::unbounded_channel();
        let acks = frames_tx.clone();

        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let (mut reader, mut writer) = stream.into_split();

            tokio::spawn(async move {
                while let Some(frame) = frames_rx.recv().await {
                    if writer.write_all(&frame).await.is_err() {
                        break;
                    }
                }
            });

            while let Some((header, body)) = read_packet(&mut reader).await {
                match header >> 4 {
                    1 => {
                        let _ = acks.send(vec![0x20, 0x02, 0x00, 0x00]);
                        let _ = seen_tx.send("CONNECT".to_string());
                    }
                    3 => {
                        let topic_len = u16::from_be_bytes([body[0], body[1]]) as usize;
                        let topic = String::from_utf8_lossy(&body[2..2 + topic_len]).into_owned();
                        if (header >> 1) & 0x03 > 0 {
                            let pkid = &body[2 + topic_len..4 + topic_len];
                            let _ = acks.send(vec![0x40, 0x02, pkid[0], pkid[1]]);
                        }
                        let _ = seen_tx.send(topic);
                    }
                    8 => {
                        let filter_len = u16::from_be_bytes([body[2], body[3]]) as usize;
                        let filter = String::from_utf8_lossy(&body[4..4 + filter_len]);
                        let _ = acks.send(vec![0x90, 0x03, body[0], body[1], 0x01]);
                        let _ = seen_tx.send(format!("SUBSCRIBE {}", filter));
                    }
                    12 => {
                        let _ = acks.send(vec![0xd0, 0x00]);
                    }
                    14 => {
                        let _ = seen_tx.send("DISCONNECT".to_string());
                        break;
                    }
                    _ => {}
                }
            }
        });

        Self {
            port,
            frames: frames_tx,
            seen: seen_rx,
        }
    }

    fn config(&self) -> MqttConfig {
        MqttConfig {
            broker: "127.0.0.1".to_string(),
            port: self.port,
            client_id: "lightbridge-test".to_string(),
            keep_alive_secs: 20,
            clean_session: true,
            username: None,
            password: None,
        }
    }

    fn send_action(&self, switch_id: &str, action: &str) {
        self.frames.send(action_frame(switch_id, action)).unwrap();
    }

    /// Wait until the client sends a packet reported as `expected`
    async fn wait_for(&mut self, expected: &str) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while let Some(seen) = self.seen.recv().await {
                if seen == expected {
                    return;
                }
            }
            panic!("broker connection closed before {}", expected);
        })
        .await
        .unwrap_or_else(|_| panic!("timed out waiting for {}", expected));
    }
}

async fn read_packet(reader: &mut OwnedReadHalf) -> Option<(u8, Vec<u8>)> {
    let header = reader.read_u8().await.ok()?;

    let mut len = 0usize;
    let mut shift = 0;
    loop {
        let byte = reader.read_u8().await.ok()?;
        len |= ((byte & 0x7f) as usize) << shift;
        if byte & 0x80 == 0 {
            break;
        }
        shift += 7;
    }

    let mut body = vec![0; len];
    reader.read_exact(&mut body).await.ok()?;
    Some((header, body))
}

fn action_frame(switch_id: &str, action: &str) -> Vec<u8> {
    publish_frame(
        &format!("zigbee2mqtt/{}/action", switch_id),
        action.as_bytes(),
    )
}

/// QoS 0 PUBLISH frame
fn publish_frame(topic: &str, payload: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(&(topic.len() as u16).to_be_bytes());
    body.extend_from_slice(topic.as_bytes());
    body.extend_from_slice(payload);

    let mut frame = vec![0x30];
    let mut len = body.len();
    loop {
        let mut byte = (len % 128) as u8;
        len /= 128;
        if len > 0 {
            byte |= 0x80;
        }
        frame.push(byte);
        if len == 0 {
            break;
        }
    }
    frame.extend(body);
    frame
}

fn mappings() -> MappingTable {
    MappingTable::new([
        LightMapping {
            switch_id: "sw1".to_string(),
            light_id: "kitchen".to_string(),
            brightness: Some(80),
        },
        LightMapping {
            switch_id: "sw2".to_string(),
            light_id: "hall".to_string(),
            brightness: None,
        },
    ])
}

#[tokio::test]
async fn test_burst_beyond_queue_capacity_keeps_flowing() {
    let mut broker = FakeBroker::start().await;

    let (events_tx, events_rx) = event_queue();
    let (shutdown_tx, _) = watch::channel(false);
    let mut client = RumqttcClient::new(&broker.config());
    client.connect(events_tx);
    let mut dispatcher = Dispatcher::new(mappings(), client);

    let driver = async {
        broker.wait_for("SUBSCRIBE zigbee2mqtt/+/action").await;
        for _ in 0..EVENT_QUEUE_CAPACITY * 3 {
            broker.send_action("sw1", "single");
        }

        // Keep pressing the hall switch until its command comes through;
        // presses that land on a full queue are dropped
        let mut kitchen = 0;
        let mut ticker = tokio::time::interval(Duration::from_millis(200));
        loop {
            tokio::select! {
                _ = ticker.tick() => broker.frames.send(action_frame("sw2", "single")).unwrap(),
                seen = broker.seen.recv() => match seen.as_deref() {
                    Some(KITCHEN_COMMAND) => kitchen += 1,
                    Some(HALL_COMMAND) => return kitchen,
                    Some(_) => {}
                    None => panic!("broker connection closed"),
                },
            }
        }
    };

    let kitchen = tokio::time::timeout(Duration::from_secs(10), async {
        tokio::select! {
            result = dispatcher.run(events_rx, &shutdown_tx) => {
                panic!("dispatcher stopped: {:?}", result)
            }
            kitchen = driver => kitchen,
        }
    })
    .await
    .expect("no command published after a burst larger than the event queue");

    assert!(kitchen <= EVENT_QUEUE_CAPACITY * 3);
    assert!(!*shutdown_tx.borrow());
}

#[tokio::test]
async fn test_close_sends_disconnect() {
    let mut broker = FakeBroker::start().await;

    let (events_tx, _events_rx) = event_queue();
    let mut client = RumqttcClient::new(&broker.config());
    client.connect(events_tx);
    broker.wait_for("SUBSCRIBE zigbee2mqtt/+/action").await;

    client.close(Duration::from_secs(2)).await.unwrap();
    broker.wait_for("DISCONNECT").await;
}
