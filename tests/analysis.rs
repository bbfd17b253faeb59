//! End-to-end analysis over synthetic radiotap frames and pcap files

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use airquality::config::{AnalyzerConfig, Config};
use airquality::wireless::{rank_by_signal, CaptureFile, MacAddr, Role, Session};
use airquality::AirQuality;

const AP_HOME: u64 = 0x0011_2233_4455;
const AP_CAFE: u64 = 0x0011_2233_4466;
const PHONE: u64 = 0x00aa_bbcc_dd01;
const LAPTOP: u64 = 0x00aa_bbcc_dd02;

fn radiotap(rssi: i8) -> Vec<u8> {
    let mut rt = vec![0u8; 25];
    rt[2] = 25;
    rt[22] = rssi as u8;
    rt
}

fn header(fc: u8, dst: u64, src: Option<u64>, len: usize) -> Vec<u8> {
    let mut mac = vec![0u8; len];
    mac[0] = fc;
    mac[4..10].copy_from_slice(&MacAddr::new(dst).octets());
    if let Some(src) = src {
        mac[10..16].copy_from_slice(&MacAddr::new(src).octets());
        mac[16..22].copy_from_slice(&MacAddr::new(src).octets());
    }
    mac
}

fn beacon(src: u64, rssi: i8, ssid: &[u8], channel: u8) -> Vec<u8> {
    let mut frame = radiotap(rssi);
    frame.extend_from_slice(&header(0x80, 0xffff_ffff_ffff, Some(src), 36));
    frame.extend_from_slice(&[0, ssid.len() as u8]);
    frame.extend_from_slice(ssid);
    frame.extend_from_slice(&[1, 1, 0x82, 3, 1, channel]);
    frame
}

fn data(src: u64, dst: u64) -> Vec<u8> {
    let mut frame = radiotap(-60);
    frame.extend_from_slice(&header(0x08, dst, Some(src), 24));
    frame.extend_from_slice(&[0u8; 32]);
    frame
}

fn ack(dst: u64) -> Vec<u8> {
    let mut frame = radiotap(-60);
    frame.extend_from_slice(&header(0xd4, dst, None, 10));
    frame
}

/// Classic pcap, little endian, radiotap link type
fn write_pcap(path: &Path, frames: &[(Vec<u8>, u32)]) {
    let mut w = BufWriter::new(File::create(path).unwrap());
    w.write_all(&0xa1b2_c3d4u32.to_le_bytes()).unwrap();
    w.write_all(&2u16.to_le_bytes()).unwrap();
    w.write_all(&4u16.to_le_bytes()).unwrap();
    w.write_all(&0i32.to_le_bytes()).unwrap();
    w.write_all(&0u32.to_le_bytes()).unwrap();
    w.write_all(&65535u32.to_le_bytes()).unwrap();
    w.write_all(&127u32.to_le_bytes()).unwrap();

    for (i, (bytes, orig_len)) in frames.iter().enumerate() {
        w.write_all(&(1_700_000_000u32 + i as u32).to_le_bytes()).unwrap();
        w.write_all(&0u32.to_le_bytes()).unwrap();
        w.write_all(&(bytes.len() as u32).to_le_bytes()).unwrap();
        w.write_all(&orig_len.to_le_bytes()).unwrap();
        w.write_all(bytes).unwrap();
    }
    w.flush().unwrap();
}

fn neighbourhood() -> Vec<(Vec<u8>, u32)> {
    vec![
        (beacon(AP_HOME, -45, b"Home", 6), 120),
        (beacon(AP_CAFE, -75, b"Cafe", 11), 120),
        (data(PHONE, AP_HOME), 300),
        (ack(PHONE), 14),
        (data(AP_HOME, PHONE), 1500),
        (data(LAPTOP, AP_CAFE), 800),
        (data(AP_CAFE, LAPTOP), 200),
        (beacon(AP_HOME, -90, b"Spoof", 1), 120),
    ]
}

#[test]
fn test_session_end_to_end() {
    let mut session = Session::default();
    session.ingest(neighbourhood());
    let analysis = session.finish();
    let registry = &analysis.registry;

    assert_eq!(registry.len(), 4);

    let home = registry.find(MacAddr::new(AP_HOME)).unwrap();
    assert_eq!(home.role, Role::AccessPoint);
    assert_eq!(home.ssid_lossy(), "Home");
    assert_eq!(home.channel, 6);
    assert_eq!(home.signal_strength, Some(-45));
    assert_eq!(home.beacon_count, 2);
    assert_eq!(home.rx_bytes, 300);
    assert_eq!(home.tx_bytes, 1500);

    let phone = registry.find(MacAddr::new(PHONE)).unwrap();
    assert_eq!(phone.role, Role::User);
    assert_eq!(phone.peer_address, Some(MacAddr::new(AP_HOME)));
    assert_eq!(phone.rx_bytes, 1500 + 14);

    let laptop = registry.find(MacAddr::new(LAPTOP)).unwrap();
    assert_eq!(laptop.peer_address, Some(MacAddr::new(AP_CAFE)));

    // rx balance: every data byte lands on both sides, ACK bytes only on rx
    assert_eq!(
        registry.total_rx_bytes(),
        registry.total_tx_bytes() + analysis.stats.control_bytes
    );

    // Channel 6: 1800 bytes at full weight; channel 11: 1000 at -75 dBm (0.5)
    let ch6 = analysis.channels.channel(6).unwrap();
    assert_eq!(ch6.traffic, 1800);
    assert_eq!(ch6.usage, 1800);
    let ch11 = analysis.channels.channel(11).unwrap();
    assert_eq!(ch11.traffic, 1000);
    assert_eq!(ch11.usage, 500);
    // Three channels of bleed: 6 reaches 3..=9, 11 reaches 8..=12
    assert_eq!(analysis.channels.channel(9).unwrap().usage, 1800 / 16 + 500 / 4);
    assert_eq!(analysis.channels.channel(1).unwrap().usage, 0);
    assert_eq!(analysis.channels.max_usage, 1800);

    let ranked: Vec<MacAddr> = rank_by_signal(registry)
        .into_iter()
        .map(|id| registry.get(id).address)
        .collect();
    assert_eq!(ranked, vec![MacAddr::new(AP_HOME), MacAddr::new(AP_CAFE)]);

    assert_eq!(analysis.stats.frames_decoded, 8);
    assert_eq!(analysis.stats.malformed_frames, 0);
}

#[test]
fn test_malformed_frames_do_not_stop_the_run() {
    let mut frames = neighbourhood();
    frames.insert(1, (vec![0u8; 4], 4));
    let mut truncated = data(PHONE, AP_HOME);
    truncated.truncate(30);
    frames.insert(3, (truncated, 300));

    let mut session = Session::default();
    session.ingest(frames);

    assert_eq!(session.stats().malformed_frames, 2);
    assert_eq!(session.stats().frames_seen, 10);
    assert_eq!(session.frame_counter(), 8);
    assert_eq!(
        session.registry().find(MacAddr::new(AP_HOME)).unwrap().tx_bytes,
        1500
    );
}

#[test]
fn test_capacity_limit_drops_accounting() {
    let config = AnalyzerConfig {
        capacity: 3,
        ..Default::default()
    };
    let mut session = Session::new(&config);
    session.ingest(neighbourhood());

    let registry = session.registry();
    assert_eq!(registry.len(), 3);
    assert!(registry.find(MacAddr::new(LAPTOP)).is_none());
    assert!(session.stats().capacity_exceeded >= 2);
    assert_eq!(
        registry.find(MacAddr::new(AP_CAFE)).unwrap().total_bytes(),
        0
    );
    assert_eq!(
        registry.total_rx_bytes(),
        registry.total_tx_bytes() + session.stats().control_bytes
    );
}

#[test]
fn test_capture_file_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("neighbourhood.pcap");
    let frames = neighbourhood();
    write_pcap(&path, &frames);

    let capture = CaptureFile::open(&path).unwrap();
    let read: Vec<_> = capture.map(|f| f.unwrap()).collect();
    assert_eq!(read.len(), frames.len());
    assert_eq!(read[0].data, frames[0].0);
    assert_eq!(read[2].captured_len, 300);
    assert_eq!(read[1].timestamp.as_secs(), 1_700_000_001);
}

#[test]
fn test_truncated_capture_keeps_earlier_frames() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cut.pcap");

    let frames = vec![
        (beacon(AP_HOME, -45, b"Home", 6), 120),
        (data(PHONE, AP_HOME), 300),
        (data(AP_HOME, PHONE), 1500),
    ];
    write_pcap(&path, &frames);

    // Last record promises 64 bytes but the file ends after 10
    let mut file = OpenOptions::new().append(true).open(&path).unwrap();
    file.write_all(&1_700_000_100u32.to_le_bytes()).unwrap();
    file.write_all(&0u32.to_le_bytes()).unwrap();
    file.write_all(&64u32.to_le_bytes()).unwrap();
    file.write_all(&64u32.to_le_bytes()).unwrap();
    file.write_all(&[0u8; 10]).unwrap();
    drop(file);

    let mut airquality = AirQuality::new(&Config::default());
    assert_eq!(airquality.add_file(&path).unwrap(), 3);
    assert_eq!(airquality.files_read(), 1);

    let analysis = airquality.finish();
    assert_eq!(analysis.stats.frames_decoded, 3);
    assert_eq!(analysis.stats.partial_files, 1);

    let phone = analysis.registry.find(MacAddr::new(PHONE)).unwrap();
    assert_eq!(phone.role, Role::User);
    assert_eq!(phone.rx_bytes, 1500);
    let home = analysis.registry.find(MacAddr::new(AP_HOME)).unwrap();
    assert_eq!(home.ssid_lossy(), "Home");
}

#[test]
fn test_files_share_one_session() {
    let dir = tempfile::tempdir().unwrap();
    let first = dir.path().join("first.pcap");
    let second = dir.path().join("second.pcap");

    let frames = neighbourhood();
    write_pcap(&first, &frames[..2]);
    write_pcap(&second, &frames[2..]);

    let mut airquality = AirQuality::new(&Config::default());
    assert_eq!(airquality.add_file(&first).unwrap(), 2);
    assert!(airquality.add_file(dir.path().join("missing.pcap")).is_err());
    assert_eq!(airquality.add_file(&second).unwrap(), 6);
    assert_eq!(airquality.files_read(), 2);

    let analysis = airquality.finish();
    // Beacons from the first file classify data in the second
    let phone = analysis.registry.find(MacAddr::new(PHONE)).unwrap();
    assert_eq!(phone.role, Role::User);
    assert_eq!(analysis.stats.frames_decoded, 8);
}
