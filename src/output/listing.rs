//! Text rendering of library reads

use crate::storage::VideoRecord;

/// `12:14` or `1:02:03`
pub fn format_duration(seconds: i64) -> String {
    let seconds = seconds.max(0);
    let (hours, minutes, secs) = (seconds / 3600, (seconds % 3600) / 60, seconds % 60);
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{}:{:02}", minutes, secs)
    }
}

/// Renders one video as a short block of lines
pub fn format_video(video: &VideoRecord) -> String {
    let mut lines = vec![format!(
        "{} [{}]",
        video.title.as_deref().unwrap_or("(untitled)"),
        video.video_id
    )];

    let mut meta = Vec::new();
    if let Some(channel) = &video.channel {
        meta.push(channel.clone());
    }
    if let Some(published) = &video.published_at {
        meta.push(published.clone());
    }
    if let Some(duration) = video.duration_seconds {
        meta.push(format_duration(duration));
    }
    if !meta.is_empty() {
        lines.push(format!("  {}", meta.join(" | ")));
    }

    lines.push(format!("  {}", video.watch_url()));

    if let Some(summary) = &video.ai_summary {
        lines.push(format!("  Summary: {}", summary));
    }
    let tags = video.tag_list();
    if !tags.is_empty() {
        lines.push(format!("  Tags: {}", tags.join(", ")));
    }

    lines.join("\n")
}

/// Prints videos to stdout, one block each
pub fn print_videos(videos: &[VideoRecord]) {
    if videos.is_empty() {
        println!("No videos found.");
        return;
    }
    for video in videos {
        println!("{}\n", format_video(video));
    }
    println!("{} videos", videos.len());
}

/// Prints channel names to stdout, one per line
pub fn print_channels(channels: &[String]) {
    for channel in channels {
        println!("{}", channel);
    }
    println!("\n{} channels", channels.len());
}
