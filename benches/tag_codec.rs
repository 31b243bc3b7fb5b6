use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::io::Cursor;

use mutagen_id3::config::{LoadOptions, SaveOptions, V2Minor};
use mutagen_id3::id3::frames::{CommentFrame, PictureFrame, TextFrame, UserTextFrame};
use mutagen_id3::id3::specs::PictureType;
use mutagen_id3::ID3Tags;

fn sample_tags() -> ID3Tags {
    let mut tags = ID3Tags::new();
    for (id, text) in [
        ("TIT2", "Hymn Risen"),
        ("TPE1", "Artist"),
        ("TALB", "Album"),
        ("TRCK", "1/12"),
        ("TCON", "(17)Rock"),
    ] {
        tags.add(TextFrame::new(id, vec![text.to_string()]));
    }
    for i in 0..20 {
        tags.add(UserTextFrame::new(&format!("key{}", i), vec![format!("value {}", i)]));
    }
    tags.add(CommentFrame::new("eng", "", vec!["comment ".repeat(40)]));
    tags.add(PictureFrame::new(
        "image/jpeg",
        PictureType::CoverFront,
        "cover",
        vec![0xAB; 64 * 1024],
    ));
    tags
}

fn bench_parse(c: &mut Criterion) {
    let v24 = sample_tags().render(SaveOptions::new()).unwrap();
    let mut v23_tags = sample_tags();
    v23_tags.update_to_v23();
    let v23 = v23_tags
        .render(SaveOptions::new().v2_version(V2Minor::V3))
        .unwrap();

    let mut group = c.benchmark_group("parse");
    group.bench_function("v24", |b| {
        b.iter(|| {
            ID3Tags::load_from(&mut Cursor::new(black_box(&v24[..])), LoadOptions::new(), None)
                .unwrap()
        })
    });
    group.bench_function("v23_translated", |b| {
        b.iter(|| {
            ID3Tags::load_from(&mut Cursor::new(black_box(&v23[..])), LoadOptions::new(), None)
                .unwrap()
        })
    });
    group.finish();
}

fn bench_render(c: &mut Criterion) {
    let tags = sample_tags();

    let mut group = c.benchmark_group("render");
    group.bench_function("v24", |b| {
        b.iter(|| black_box(&tags).render(SaveOptions::new()).unwrap())
    });
    group.bench_function("v23", |b| {
        b.iter(|| {
            black_box(&tags)
                .render(SaveOptions::new().v2_version(V2Minor::V3))
                .unwrap()
        })
    });
    group.finish();
}

criterion_group!(benches, bench_parse, bench_render);
criterion_main!(benches);
