use super::*;
use rand::RngCore;
use tempfile::NamedTempFile;

const IMAGE_LEN: u64 = 1 << 20;

fn tmp_path_str(tf: &NamedTempFile) -> String {
    tf.path().to_string_lossy().into_owned()
}

#[test]
fn create_presizes_the_image() {
    let tf = NamedTempFile::new().expect("tmp file");
    let path = tmp_path_str(&tf);

    let s = FileStore::create(&path, IMAGE_LEN).expect("create");
    assert_eq!(s.len(), IMAGE_LEN);
    let meta = s.file.metadata().expect("metadata");
    assert_eq!(meta.len(), IMAGE_LEN, "backing file must be pre-sized");
}

#[test]
fn fresh_image_reads_as_zero() {
    let tf = NamedTempFile::new().expect("tmp file");
    let path = tmp_path_str(&tf);

    let mut s = FileStore::create(&path, IMAGE_LEN).expect("create");

    let mut buf = vec![0xAAu8; 4096];
    s.seek(0).expect("seek");
    assert_eq!(s.read(&mut buf).expect("read"), 4096);
    assert!(buf.iter().all(|&b| b == 0));

    s.seek(555_000).expect("seek");
    let mut buf2 = vec![0xAAu8; 1234];
    assert_eq!(s.read(&mut buf2).expect("read"), 1234);
    assert!(buf2.iter().all(|&b| b == 0));
}

#[test]
fn write_then_read_roundtrip_same_session() {
    let tf = NamedTempFile::new().expect("tmp file");
    let path = tmp_path_str(&tf);
    let mut s = FileStore::create(&path, IMAGE_LEN).expect("create");

    let off = 64 * 1024 + 123;
    let mut data = vec![0u8; 8192];
    rand::rng().fill_bytes(&mut data);

    s.seek(off).expect("seek");
    assert_eq!(s.write(&data).expect("write"), data.len());

    s.seek(off).expect("seek");
    let mut back = vec![0u8; data.len()];
    assert_eq!(s.read(&mut back).expect("read"), data.len());
    assert_eq!(back, data);
}

#[test]
fn reopen_sees_flushed_bytes() {
    let tf = NamedTempFile::new().expect("tmp file");
    let path = tmp_path_str(&tf);
    let off = IMAGE_LEN / 2 - 200;

    {
        let mut s = FileStore::create(&path, IMAGE_LEN).expect("create");
        s.seek(off).expect("seek");
        assert_eq!(s.write(b"hello-from-mmap!").expect("write"), 16);
        s.flush().expect("flush");
    }

    {
        let mut s = FileStore::open(&path).expect("reopen");
        assert_eq!(s.len(), IMAGE_LEN);
        s.seek(off).expect("seek");
        let mut buf = vec![0u8; 16];
        assert_eq!(s.read(&mut buf).expect("read"), 16);
        assert_eq!(&buf, b"hello-from-mmap!");
    }
}

#[test]
fn transfers_truncate_at_end_of_image() {
    let tf = NamedTempFile::new().expect("tmp file");
    let path = tmp_path_str(&tf);
    let mut s = FileStore::create(&path, IMAGE_LEN).expect("create");

    s.seek(IMAGE_LEN - 512).expect("seek");
    let mut buf = vec![0xCCu8; 4096];
    assert_eq!(s.read(&mut buf).expect("read"), 512);
    assert!(buf[512..].iter().all(|&b| b == 0xCC), "untouched tail");

    s.seek(IMAGE_LEN - 100).expect("seek");
    let data = vec![0x5Au8; 500];
    assert_eq!(s.write(&data).expect("write"), 100);
    assert_eq!(s.write(&data).expect("write"), 0);
}

#[test]
fn set_len_grows_zero_filled_and_remaps() {
    let tf = NamedTempFile::new().expect("tmp file");
    let path = tmp_path_str(&tf);
    let mut s = FileStore::create(&path, 4096).expect("create");

    s.seek(0).expect("seek");
    assert_eq!(s.write(&[0xEE; 4096]).expect("write"), 4096);

    s.set_len(8192).expect("grow");
    assert_eq!(s.len(), 8192);

    s.seek(0).expect("seek");
    let mut buf = vec![0u8; 8192];
    assert_eq!(s.read(&mut buf).expect("read"), 8192);
    assert!(buf[..4096].iter().all(|&b| b == 0xEE), "old bytes survive");
    assert!(buf[4096..].iter().all(|&b| b == 0), "new bytes are zero");
}

#[test]
fn zero_length_image_is_inert() {
    let tf = NamedTempFile::new().expect("tmp file");
    let path = tmp_path_str(&tf);
    let mut s = FileStore::create(&path, 0).expect("create");

    assert!(s.is_empty());
    let mut buf = [0u8; 8];
    assert_eq!(s.read(&mut buf).expect("read"), 0);
    assert_eq!(s.write(&buf).expect("write"), 0);

    s.set_len(16).expect("grow");
    s.seek(0).expect("seek");
    assert_eq!(s.read(&mut buf).expect("read"), 8);
    assert!(buf.iter().all(|&b| b == 0));
}
