use std::fs;
use std::path::{Path, PathBuf};

use mutagen_id3::config::{DeleteOptions, LoadOptions, SaveOptions, V1Mode, V2Minor};
use mutagen_id3::id3::frames::{CommentFrame, PictureFrame, TextFrame};
use mutagen_id3::id3::header::{BitPaddedInt, Version};
use mutagen_id3::id3::specs::{FieldValue, PictureType};
use mutagen_id3::{Frame, ID3Tags, MutagenError};
use tempfile::TempDir;

const AUDIO_LEN: usize = 4000;

fn audio() -> Vec<u8> {
    (0..AUDIO_LEN).map(|i| (i * 7 % 253) as u8).collect()
}

fn write_file(dir: &TempDir, name: &str, data: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, data).unwrap();
    path
}

fn frame(id: &[u8], body: &[u8]) -> Vec<u8> {
    let mut out = id.to_vec();
    out.extend_from_slice(&(body.len() as u32).to_be_bytes());
    out.extend_from_slice(&[0, 0]);
    out.extend_from_slice(body);
    out
}

fn tag(major: u8, frames: &[u8]) -> Vec<u8> {
    let mut out = vec![b'I', b'D', b'3', major, 0, 0];
    out.extend_from_slice(&BitPaddedInt::to_syncsafe(frames.len() as u32).unwrap());
    out.extend_from_slice(frames);
    out
}

fn v1_block(title: &str, track: u8, genre: u8) -> Vec<u8> {
    let mut out = b"TAG".to_vec();
    let mut title = title.as_bytes().to_vec();
    title.resize(30, 0);
    out.extend(title);
    out.extend([0u8; 30 + 30]);
    out.extend(b"1999");
    out.extend([0u8; 29]);
    out.extend([track, genre]);
    out
}

fn texts(tags: &ID3Tags, key: &str) -> Vec<String> {
    tags.get(key)
        .and_then(Frame::text)
        .map(<[String]>::to_vec)
        .unwrap_or_default()
}

fn file_len(path: &Path) -> usize {
    fs::metadata(path).unwrap().len() as usize
}

#[test_log::test]
fn save_then_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(&dir, "plain.mp3", &audio());

    let mut tags = ID3Tags::new();
    tags.add(TextFrame::new("TIT2", vec!["Title".into()]));
    tags.add(TextFrame::new("TPE1", vec!["One".into(), "Two".into()]));
    tags.add(CommentFrame::new("eng", "note", vec!["ünïcödé".into()]));
    tags.add(PictureFrame::new(
        "image/png",
        PictureType::CoverFront,
        "",
        vec![0x89, b'P', b'N', b'G'],
    ));
    tags.save_to(&path, SaveOptions::new()).unwrap();

    assert_eq!(file_len(&path), 10 + 1024 + AUDIO_LEN);
    let data = fs::read(&path).unwrap();
    assert!(data.ends_with(&audio()));

    let loaded = ID3Tags::load(&path, LoadOptions::new()).unwrap();
    assert_eq!(loaded.version(), Version::V24);
    assert_eq!(loaded.pprint(), tags.pprint());
    assert_eq!(texts(&loaded, "TPE1"), ["One", "Two"]);
    assert_eq!(loaded.size(), 10 + 1024);
}

#[test_log::test]
fn save_without_path_fails() {
    let tags = ID3Tags::new();
    assert!(matches!(
        tags.save(SaveOptions::new()),
        Err(MutagenError::ValueError(_))
    ));
}

#[test_log::test]
fn save_creates_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("new.mp3");

    let mut tags = ID3Tags::new();
    tags.add(TextFrame::new("TALB", vec!["Album".into()]));
    tags.save_to(&path, SaveOptions::new()).unwrap();
    assert_eq!(file_len(&path), 10 + 1024);

    // Nothing to write and nothing to delete.
    ID3Tags::new()
        .save_to(dir.path().join("other.mp3"), SaveOptions::new())
        .unwrap();
    assert!(!dir.path().join("other.mp3").exists());
}

#[test_log::test]
fn v23_tag_is_migrated_and_saved_as_v24() {
    let dir = tempfile::tempdir().unwrap();
    let mut frames = frame(b"TYER", b"\x002006");
    frames.extend(frame(b"TDAT", b"\x000603"));
    frames.extend(frame(b"TIME", b"\x001127"));
    frames.extend(frame(b"TRDA", b"\x00whenever"));
    frames.extend(frame(b"XTRA", b"opaque data"));
    let mut data = tag(3, &frames);
    data.extend(audio());
    let path = write_file(&dir, "v23.mp3", &data);

    let mut tags = ID3Tags::load(&path, LoadOptions::new()).unwrap();
    assert_eq!(tags.pprint(), "TDRC=2006-03-06 11:27:00");
    assert_eq!(tags.unknown_frames().len(), 1);

    tags.save(SaveOptions::new()).unwrap();
    let raw = ID3Tags::load(&path, LoadOptions::new().translate(false)).unwrap();
    assert_eq!(raw.version(), Version::V24);
    assert_eq!(raw.pprint(), "TDRC=2006-03-06 11:27:00");
    assert_eq!(raw.unknown_frames().len(), 1);
    assert_eq!(&raw.unknown_frames()[0][..4], b"XTRA");
    assert!(fs::read(&path).unwrap().ends_with(&audio()));
}

#[test_log::test]
fn v24_tag_saved_as_v23() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("down.mp3");

    let mut tags = ID3Tags::new();
    tags.add(
        Frame::new("TDRC", vec![FieldValue::Int(3), FieldValue::Text("2004-12-27 12:30".into())])
            .unwrap(),
    );
    tags.add(TextFrame::new("TPE1", vec!["One".into(), "Two".into()]));
    tags.save_to(&path, SaveOptions::new()).unwrap();

    let mut tags = ID3Tags::load(&path, LoadOptions::new().v2_version(V2Minor::V3)).unwrap();
    assert_eq!(tags.version(), Version::V23);
    tags.save(SaveOptions::new().v2_version(V2Minor::V3)).unwrap();

    let raw = ID3Tags::load(&path, LoadOptions::new().translate(false)).unwrap();
    assert_eq!(raw.version(), Version::V23);
    assert_eq!(texts(&raw, "TYER"), ["2004"]);
    assert_eq!(texts(&raw, "TDAT"), ["2712"]);
    assert_eq!(texts(&raw, "TIME"), ["1230"]);
    assert_eq!(texts(&raw, "TPE1"), ["One/Two"]);
    assert!(raw.get("TDRC").is_none());
}

#[test_log::test]
fn v22_picture_is_upgraded() {
    let dir = tempfile::tempdir().unwrap();
    let mut frames = b"TT2\x00\x00\x06\x00Title".to_vec();
    frames.extend(b"PIC\x00\x00\x0a\x00PNG\x03\x00\x89PNG");
    let mut data = tag(2, &frames);
    data.extend(audio());
    let path = write_file(&dir, "v22.mp3", &data);

    let tags = ID3Tags::load(&path, LoadOptions::new()).unwrap();
    let Some(Frame::Picture(pic)) = tags.get("APIC:") else {
        panic!("no picture in {}", tags.pprint());
    };
    assert_eq!(pic.id, "APIC");
    assert_eq!(pic.mime, "image/png");
    assert_eq!(pic.picture_type(), Some(PictureType::CoverFront));
    assert_eq!(texts(&tags, "TIT2"), ["Title"]);

    tags.save(SaveOptions::new()).unwrap();
    let reloaded = ID3Tags::load(&path, LoadOptions::new()).unwrap();
    assert_eq!(reloaded.pprint(), tags.pprint());
    assert_eq!(reloaded.version(), Version::V24);
}

#[test_log::test]
fn v1_fallback() {
    let dir = tempfile::tempdir().unwrap();
    let mut data = audio();
    data.extend(v1_block("Old Title", 0, 255));
    let path = write_file(&dir, "v1.mp3", &data);

    let tags = ID3Tags::load(&path, LoadOptions::new()).unwrap();
    assert!(tags.is_from_v1());
    assert_eq!(texts(&tags, "TIT2"), ["Old Title"]);
    assert!(tags.get("TRCK").is_none());
    assert!(tags.get("TCON").is_none());
    assert_eq!(tags.get("TDRC").map(ToString::to_string).as_deref(), Some("1999"));

    let mut data = audio();
    data.extend(v1_block("Numbered", 5, 17));
    let path = write_file(&dir, "v1-track.mp3", &data);
    let tags = ID3Tags::load(&path, LoadOptions::new()).unwrap();
    assert_eq!(texts(&tags, "TRCK"), ["5"]);
    assert_eq!(texts(&tags, "TCON"), ["Rock"]);
}

#[test_log::test]
fn no_tags_at_all() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(&dir, "bare.mp3", &audio());
    assert!(matches!(
        ID3Tags::load(&path, LoadOptions::new()),
        Err(MutagenError::ID3NoHeader)
    ));
    assert!(matches!(
        mutagen_id3::id3::load(dir.path().join("missing.mp3")),
        Err(MutagenError::Io(_))
    ));
}

#[test_log::test]
fn v1_is_updated_on_save() {
    let dir = tempfile::tempdir().unwrap();
    let mut data = audio();
    data.extend(v1_block("Old Title", 3, 255));
    let path = write_file(&dir, "update.mp3", &data);

    let mut tags = ID3Tags::load(&path, LoadOptions::new()).unwrap();
    tags.add(TextFrame::new("TIT2", vec!["New Title".into()]));
    tags.save(SaveOptions::new()).unwrap();

    let data = fs::read(&path).unwrap();
    assert_eq!(data.len(), 10 + 1024 + AUDIO_LEN + 128);
    let v1 = &data[data.len() - 128..];
    assert_eq!(&v1[..12], b"TAGNew Title");
    assert_eq!(v1[126], 3);

    tags.save(SaveOptions::new().v1(V1Mode::Remove)).unwrap();
    assert_eq!(file_len(&path), 10 + 1024 + AUDIO_LEN);
}

#[test_log::test]
fn growing_tag_shifts_audio() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(&dir, "grow.mp3", &audio());

    let mut tags = ID3Tags::new();
    tags.add(TextFrame::new("TIT2", vec!["Small".into()]));
    tags.save_to(&path, SaveOptions::new()).unwrap();
    assert_eq!(file_len(&path), 10 + 1024 + AUDIO_LEN);

    let mut tags = ID3Tags::load(&path, LoadOptions::new()).unwrap();
    tags.add(PictureFrame::new("image/jpeg", PictureType::CoverFront, "", vec![7; 3000]));
    tags.save(SaveOptions::new()).unwrap();
    assert_eq!(file_len(&path), 10 + 3072 + AUDIO_LEN);
    assert!(fs::read(&path).unwrap().ends_with(&audio()));

    // Shrinking keeps the region.
    tags.delete_all("APIC");
    tags.save(SaveOptions::new()).unwrap();
    assert_eq!(file_len(&path), 10 + 3072 + AUDIO_LEN);
    let reloaded = ID3Tags::load(&path, LoadOptions::new()).unwrap();
    assert_eq!(reloaded.pprint(), "TIT2=Small");
}

#[test_log::test]
fn delete_restores_audio() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(&dir, "delete.mp3", &audio());

    let mut tags = ID3Tags::new();
    tags.add(TextFrame::new("TIT2", vec!["Title".into()]));
    tags.save_to(&path, SaveOptions::new().v1(V1Mode::Always)).unwrap();
    assert_eq!(file_len(&path), 10 + 1024 + AUDIO_LEN + 128);

    let mut tags = ID3Tags::load(&path, LoadOptions::new()).unwrap();
    tags.delete_tags(DeleteOptions::new().delete_v1(false)).unwrap();
    assert!(tags.is_empty());
    assert_eq!(file_len(&path), AUDIO_LEN + 128);

    mutagen_id3::id3::delete(&path, DeleteOptions::new()).unwrap();
    assert_eq!(fs::read(&path).unwrap(), audio());

    // Deleting again is a no-op.
    mutagen_id3::id3::delete(&path, DeleteOptions::new()).unwrap();
    assert_eq!(file_len(&path), AUDIO_LEN);
}
