use std::time::Duration;

use anyhow::Result;

use pose_relay::transport::{EnvelopeListener, EnvelopeSink, UdpSender};
use pose_relay::{filter_landmarks, Landmark, Pose, PoseEnvelope};

fn upper_body_pose() -> Pose {
    let landmarks = (0..33)
        .map(|i| Landmark::new(i, 0.02 * i as f32, 1.0 - 0.02 * i as f32, -0.01 * i as f32))
        .collect();
    Pose::new(landmarks, 0.95)
}

#[test]
fn sent_envelope_arrives_intact() -> Result<()> {
    let mut listener = EnvelopeListener::bind("127.0.0.1:0")?;
    listener.set_timeout(Some(Duration::from_secs(5)))?;
    let mut sender = UdpSender::bind_to(listener.local_addr()?)?;

    let pose = upper_body_pose();
    let bytes = sender.send(&PoseEnvelope::from_pose(&pose))?;
    assert!(bytes > 0);

    let (received, _from) = listener.recv()?;
    assert_eq!(received.pose, filter_landmarks(&pose.landmarks));
    assert!(received.is_complete());
    let indices: Vec<u32> = received.pose.iter().map(|lm| lm.index).collect();
    assert_eq!(indices, vec![0, 11, 12, 13, 14, 15, 16]);

    sender.close();
    assert_eq!(sender.stats().datagrams_sent, 1);
    Ok(())
}

#[test]
fn one_datagram_per_send() -> Result<()> {
    let mut listener = EnvelopeListener::bind("127.0.0.1:0")?;
    listener.set_timeout(Some(Duration::from_secs(5)))?;
    let mut sender = UdpSender::bind_to(listener.local_addr()?)?;

    let partial = Pose::new(
        vec![
            Landmark::new(0, 0.5, 0.1, -0.2),
            Landmark::new(5, 0.4, 0.1, -0.2),
            Landmark::new(11, 0.6, 0.3, 0.0),
            Landmark::new(12, 0.4, 0.3, 0.0),
            Landmark::new(20, 0.2, 0.6, 0.1),
        ],
        0.9,
    );
    sender.send(&PoseEnvelope::from_pose(&partial))?;
    sender.send(&PoseEnvelope::default())?;

    let (first, _) = listener.recv()?;
    let names: Vec<&str> = first.pose.iter().map(|lm| &*lm.name).collect();
    assert_eq!(names, vec!["Head", "L.Shoulder", "R.Shoulder"]);
    assert!(!first.is_complete());

    let (second, _) = listener.recv()?;
    assert!(second.is_empty());
    Ok(())
}
