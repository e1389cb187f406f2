//! Media types of the asset formats the overlay recognizes.

/// Extensions recognized as media assets when no extra ones are configured.
pub const MEDIA_EXTENSIONS: &[&str] = &[
	// images
	"avif", "bmp", "gif", "heic", "heif", "ico", "jpeg", "jpg", "png", "svg", "tif", "tiff", "webp",
	// audio
	"aac", "flac", "m4a", "mid", "midi", "mp3", "oga", "ogg", "opus", "wav", "weba",
	// video
	"3g2", "3gp", "avi", "m4v", "mkv", "mov", "mp4", "mpeg", "ogv", "webm",
];

/// Media type for a (lowercase) file extension.
#[must_use]
pub fn media_type_for_extension(ext: &str) -> Option<&'static str> {
	Some(match ext {
		// AAC audio
		"aac" => "audio/aac",
		// FLAC audio
		"flac" => "audio/flac",
		// Musical Instrument Digital Interface (MIDI)
		"mid" | "midi" => "audio/midi",
		// MP3 audio
		"mp3" => "audio/mpeg",
		// MP4 audio
		"m4a" => "audio/mp4",
		// OGG audio
		"oga" | "ogg" => "audio/ogg",
		// Opus audio
		"opus" => "audio/opus",
		// Waveform Audio Format
		"wav" => "audio/wav",
		// WEBM audio
		"weba" => "audio/webm",
		// AVI: Audio Video Interleave
		"avi" => "video/x-msvideo",
		// MP4 video
		"mp4" | "m4v" => "video/mp4",
		// Matroska video
		"mkv" => "video/x-matroska",
		// MPEG Video
		"mpeg" => "video/mpeg",
		// OGG video
		"ogv" => "video/ogg",
		// WEBM video
		"webm" => "video/webm",
		// 3GPP audio/video container
		"3gp" => "video/3gpp",
		// 3GPP2 audio/video container
		"3g2" => "video/3gpp2",
		// Quicktime movies
		"mov" => "video/quicktime",
		// Windows OS/2 Bitmap Graphics
		"bmp" => "image/bmp",
		// Graphics Interchange Format (GIF)
		"gif" => "image/gif",
		// Icon format
		"ico" => "image/vnd.microsoft.icon",
		// JPEG images
		"jpeg" | "jpg" => "image/jpeg",
		// Portable Network Graphics
		"png" => "image/png",
		// Scalable Vector Graphics (SVG)
		"svg" => "image/svg+xml",
		// Tagged Image File Format (TIFF)
		"tif" | "tiff" => "image/tiff",
		// WEBP image
		"webp" => "image/webp",
		// HEIF/HEIC images
		"heif" => "image/heif",
		"heic" => "image/heic",
		// AVIF images
		"avif" => "image/avif",
		_ => return None,
	})
}

/// Lowercased extension of the last segment of `path`, if any.
#[must_use]
pub fn extension_of(path: &str) -> Option<String> {
	let file_name = path.rsplit('/').next()?;
	let (stem, ext) = file_name.rsplit_once('.')?;

	(!stem.is_empty() && !ext.is_empty()).then(|| ext.to_ascii_lowercase())
}
