use super::{
    StarfieldConfig,
    sim::{Starfield, TrailSegment},
};
use std::{collections::BTreeMap, fmt::Write};

const BACKGROUND: &str = "rgb(17, 24, 39)";
const TRAIL_FILL: &str = "rgb(180,205,255)";
/// Consecutive trail quads lie on one line, so groups of this many are drawn as one.
const TRAIL_MERGE: usize = 5;

struct StarTrack {
    size: f64,
    glows: bool,
    positions: Vec<(f64, f64)>,
    opacities: Vec<f64>,
}

struct MeteorTrack {
    first_sample: usize,
    positions: Vec<(f64, f64)>,
    opacities: Vec<f64>,
    trails: Vec<Vec<TrailSegment>>,
}

/// Runs the simulation for one loop and writes it out as a looping animated SVG.
///
/// Every `sample_every` frames the star opacities and positions and the meteor
/// heads are recorded as keyframes; the browser interpolates between them.
/// Each sampled meteor trail is drawn as its own group, shown only for that
/// sample's slice of the loop.
pub fn render_svg(width: u32, height: u32, seed: u64, config: &StarfieldConfig) -> String {
    let fps = config.frames_per_second.max(1);
    let sample_every = config.sample_every.max(1);
    let frames = (config.loop_seconds.max(1) * fps) as usize;
    let frame_ms = 1000.0 / fps as f64;

    let mut field = Starfield::new(width as f64, height as f64, seed);

    let mut stars: Vec<StarTrack> = field
        .stars()
        .iter()
        .map(|star| StarTrack {
            size: star.size,
            glows: star.glows(),
            positions: Vec::new(),
            opacities: Vec::new(),
        })
        .collect();
    let mut meteors: BTreeMap<u64, MeteorTrack> = BTreeMap::new();
    let mut samples = 0;

    for frame in 0..frames {
        field.tick(frame as f64 * frame_ms);
        if frame % sample_every != 0 {
            continue;
        }

        for (track, star) in stars.iter_mut().zip(field.stars()) {
            track.positions.push((star.x, star.y));
            track.opacities.push(star.visible_opacity());
        }

        for meteor in field.meteors() {
            let track = meteors.entry(meteor.id).or_insert_with(|| MeteorTrack {
                first_sample: samples,
                positions: Vec::new(),
                opacities: Vec::new(),
                trails: Vec::new(),
            });
            track.positions.push((meteor.x, meteor.y));
            track.opacities.push(meteor.opacity);
            track.trails.push(merge_trail(&meteor.trail_segments()));
        }

        samples += 1;
    }

    let duration = format!("{}s", config.loop_seconds.max(1));
    let mut svg = String::with_capacity(64 * 1024);

    let _ = write!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" preserveAspectRatio="xMidYMid slice">"#,
        w = width,
        h = height
    );
    svg.push_str(concat!(
        r#"<defs>"#,
        r#"<radialGradient id="meteor-head">"#,
        r#"<stop offset="0" stop-color="rgb(255,255,255)" stop-opacity="1"/>"#,
        r#"<stop offset="0.3" stop-color="rgb(240,245,255)" stop-opacity="0.9"/>"#,
        r#"<stop offset="0.6" stop-color="rgb(200,220,255)" stop-opacity="0.6"/>"#,
        r#"<stop offset="1" stop-color="rgb(150,180,255)" stop-opacity="0.1"/>"#,
        r#"</radialGradient>"#,
        r#"</defs>"#
    ));
    let _ = write!(
        svg,
        r#"<rect width="100%" height="100%" fill="{}"/>"#,
        BACKGROUND
    );

    for track in &stars {
        write_star(&mut svg, track, &duration);
    }

    for track in meteors.values() {
        write_meteor(&mut svg, track, samples, &duration);
    }

    svg.push_str("</svg>");
    svg
}

fn join_values<T>(values: impl Iterator<Item = T>, format: impl Fn(T) -> String) -> String {
    values.map(format).collect::<Vec<_>>().join(";")
}

fn write_star(svg: &mut String, track: &StarTrack, duration: &str) {
    let Some(&(x, y)) = track.positions.first() else {
        return;
    };

    let _ = write!(
        svg,
        r#"<circle cx="{:.1}" cy="{:.1}" r="{:.2}" fill="white""#,
        x, y, track.size
    );
    if track.glows {
        svg.push_str(r#" style="filter:drop-shadow(0 0 3px rgba(255,255,255,0.5))""#);
    }
    svg.push('>');

    let _ = write!(
        svg,
        r#"<animate attributeName="opacity" values="{}" dur="{}" repeatCount="indefinite"/>"#,
        join_values(track.opacities.iter(), |o| format!("{:.2}", o)),
        duration
    );

    // Stars that faded out were relocated; jump rather than glide.
    if track.positions.iter().any(|&p| p != (x, y)) {
        let _ = write!(
            svg,
            r#"<animate attributeName="cx" calcMode="discrete" values="{}" dur="{}" repeatCount="indefinite"/>"#,
            join_values(track.positions.iter(), |p| format!("{:.1}", p.0)),
            duration
        );
        let _ = write!(
            svg,
            r#"<animate attributeName="cy" calcMode="discrete" values="{}" dur="{}" repeatCount="indefinite"/>"#,
            join_values(track.positions.iter(), |p| format!("{:.1}", p.1)),
            duration
        );
    }

    svg.push_str("</circle>");
}

/// Joins runs of `TRAIL_MERGE` quads into one quad from the tail edge of the
/// first to the head edge of the last, keeping the taper.
fn merge_trail(segments: &[TrailSegment]) -> Vec<TrailSegment> {
    segments
        .chunks(TRAIL_MERGE)
        .filter_map(|chunk| {
            let (first, last) = (chunk.first()?, chunk.last()?);
            let opacity = chunk.iter().map(|s| s.opacity).sum::<f64>() / chunk.len() as f64;
            Some(TrailSegment {
                corners: [
                    first.corners[0],
                    first.corners[1],
                    last.corners[2],
                    last.corners[3],
                ],
                opacity,
                width: last.width,
            })
        })
        .collect()
}

/// Discrete opacity keyframes that show sample `sample` of `samples` until
/// the next one takes over. `None` for a sample with no time slice.
fn sample_window(sample: usize, samples: usize) -> Option<(String, String)> {
    if samples < 2 || sample + 1 >= samples {
        return None;
    }

    let span = (samples - 1) as f64;
    let start = sample as f64 / span;
    let end = (sample + 1) as f64 / span;

    Some(if sample == 0 {
        ("1;0".to_string(), format!("0;{:.4}", end))
    } else if sample + 2 == samples {
        ("0;1".to_string(), format!("0;{:.4}", start))
    } else {
        ("0;1;0".to_string(), format!("0;{:.4};{:.4}", start, end))
    })
}

fn write_trail(
    svg: &mut String,
    segments: &[TrailSegment],
    sample: usize,
    samples: usize,
    duration: &str,
) {
    let visible: Vec<&TrailSegment> = segments
        .iter()
        .filter(|segment| segment.opacity * 0.6 >= 0.005)
        .collect();
    if visible.is_empty() {
        return;
    }
    let Some((values, key_times)) = sample_window(sample, samples) else {
        return;
    };

    let _ = write!(
        svg,
        r#"<g class="meteor-trail" opacity="0"><animate attributeName="opacity" calcMode="discrete" values="{}" keyTimes="{}" dur="{}" repeatCount="indefinite"/>"#,
        values, key_times, duration
    );
    for segment in visible {
        let points = segment
            .corners
            .iter()
            .map(|(x, y)| format!("{:.1},{:.1}", x, y))
            .collect::<Vec<_>>()
            .join(" ");
        let _ = write!(
            svg,
            r#"<polygon points="{}" fill="{}" fill-opacity="{:.2}"/>"#,
            points,
            TRAIL_FILL,
            segment.opacity * 0.6
        );
    }
    svg.push_str("</g>");
}

fn write_meteor(svg: &mut String, track: &MeteorTrack, samples: usize, duration: &str) {
    let (Some(&first), Some(&last)) = (track.positions.first(), track.positions.last()) else {
        return;
    };
    let last_sample = track.first_sample + track.positions.len();

    let position_at = |sample: usize| {
        if sample < track.first_sample {
            first
        } else if sample >= last_sample {
            last
        } else {
            track.positions[sample - track.first_sample]
        }
    };
    let opacity_at = |sample: usize| {
        if sample < track.first_sample || sample >= last_sample {
            0.0
        } else {
            track.opacities[sample - track.first_sample]
        }
    };

    for (offset, segments) in track.trails.iter().enumerate() {
        write_trail(svg, segments, track.first_sample + offset, samples, duration);
    }

    let _ = write!(
        svg,
        r#"<g opacity="0"><animate attributeName="opacity" values="{}" dur="{}" repeatCount="indefinite"/>"#,
        join_values(0..samples, |s| format!("{:.2}", opacity_at(s))),
        duration
    );
    let _ = write!(
        svg,
        r#"<animateTransform attributeName="transform" type="translate" values="{}" dur="{}" repeatCount="indefinite"/>"#,
        join_values(0..samples, |s| {
            let (x, y) = position_at(s);
            format!("{:.1},{:.1}", x, y)
        }),
        duration
    );
    svg.push_str(r#"<circle r="5" fill="url(#meteor-head)"/></g>"#);
}
