//! Download flow for a single TikTok link: resolve, fetch, upload.
//!
//! The user sees one "processing" message that is edited through the stages
//! and deleted once the video (or the direct link) has been sent.

use teloxide::prelude::*;
use teloxide::types::{ChatAction, InputFile, MessageId, ParseMode, ReplyParameters};
use tikcore::metrics::{self, outcome};
use tikcore::{FetchError, Media, ResolveError, ResolvedVideo};

use super::handlers::{HandlerDeps, HandlerError};
use super::menu::direct_link_keyboard;
use super::notifications::{error_report, is_unexpected_fetch_error, notify_admin};
use super::texts;

const VIDEO_FILE_NAME: &str = "tiktok.mp4";

/// How an oversized video can still reach the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SizeRoute {
    /// Within the limit, or size unknown: upload it
    Upload,
    /// Over the limit, the provider gave a link the user can open directly
    DirectLink,
    /// Over the limit and there is nothing to link to
    TooLarge,
}

/// Picks the delivery route from the size a provider reported.
pub fn route_for(video: &ResolvedVideo, limit: u64) -> SizeRoute {
    match video.payload.size_estimate {
        Some(size) if size > limit => match video.payload.media {
            Media::Url(_) => SizeRoute::DirectLink,
            Media::Bytes(_) => SizeRoute::TooLarge,
        },
        _ => SizeRoute::Upload,
    }
}

/// Runs the whole flow for `url`, replying to `msg`.
///
/// Every failure the user can act on is reported in chat and counted; only
/// errors talking to Telegram itself bubble up.
pub async fn process_tiktok_url(bot: &Bot, msg: &Message, url: &str, deps: &HandlerDeps) -> Result<(), HandlerError> {
    let chat_id = msg.chat.id;
    deps.stats.record_request();
    log::info!("🎬 Processing TikTok URL from chat {}: {}", chat_id.0, url);

    let status = bot
        .send_message(chat_id, texts::STAGE_FETCHING_INFO)
        .parse_mode(ParseMode::Html)
        .reply_parameters(ReplyParameters::new(msg.id))
        .await?;
    send_action(bot, chat_id, ChatAction::Typing).await;

    let video = match deps.chain.resolve_with_quality(url, deps.quality_for(chat_id)).await {
        Ok(video) => video,
        Err(ResolveError::InvalidUrl(e)) => {
            log::warn!("Rejected URL {}: {}", url, e);
            edit_status(bot, chat_id, status.id, texts::rejected_url(&e)).await;
            finish_failed(deps, outcome::INVALID_URL);
            return Ok(());
        }
        // The chain already logged every attempt
        Err(ResolveError::Exhausted(aggregate)) => {
            edit_status(bot, chat_id, status.id, &texts::download_failed(&aggregate.user_message())).await;
            finish_failed(deps, outcome::FAILED);
            return Ok(());
        }
    };

    let limit = deps.max_file_size();
    match route_for(&video, limit) {
        SizeRoute::Upload => {}
        SizeRoute::DirectLink => {
            return send_direct_link(bot, msg, status.id, &video, video.payload.size_estimate, deps).await;
        }
        SizeRoute::TooLarge => {
            edit_status(bot, chat_id, status.id, &texts::file_too_large(video.payload.size_estimate, limit)).await;
            finish_failed(deps, outcome::FAILED);
            return Ok(());
        }
    }

    edit_status(bot, chat_id, status.id, texts::STAGE_DOWNLOADING).await;
    let fetched = match deps.fetcher.fetch(&video).await {
        Ok(fetched) => fetched,
        Err(FetchError::TooLarge { size, .. }) if video.payload.media_url().is_some() => {
            return send_direct_link(bot, msg, status.id, &video, size, deps).await;
        }
        Err(e) => {
            log::error!("❌ Fetch failed for {} via {}: {}", url, video.source, e);
            edit_status(bot, chat_id, status.id, &texts::download_failed(&e.user_message())).await;
            finish_failed(deps, outcome::FETCH_FAILED);
            if is_unexpected_fetch_error(&e) {
                let user_id = msg.from.as_ref().map(|u| u.id);
                notify_admin(bot, deps.admin_chat, &error_report(user_id, url, &e.to_string())).await;
            }
            return Ok(());
        }
    };

    edit_status(bot, chat_id, status.id, texts::STAGE_UPLOADING).await;
    send_action(bot, chat_id, ChatAction::UploadVideo).await;

    let size = fetched.size();
    let caption = texts::caption(&fetched.video, size);
    let upload = bot
        .send_video(chat_id, InputFile::memory(fetched.bytes.to_vec()).file_name(VIDEO_FILE_NAME))
        .caption(caption)
        .parse_mode(ParseMode::Html)
        .supports_streaming(true)
        .reply_parameters(ReplyParameters::new(msg.id))
        .await;

    match upload {
        Ok(_) => {
            log::info!("✅ Sent {:.1}MB video from {} to chat {}", texts::megabytes(size), video.source, chat_id.0);
            delete_status(bot, chat_id, status.id).await;
            deps.stats.record_success();
            metrics::record_download(outcome::SUCCESS);
        }
        Err(e) => {
            log::error!("❌ Upload to chat {} failed: {}", chat_id.0, e);
            edit_status(bot, chat_id, status.id, &texts::upload_failed(&e.to_string())).await;
            finish_failed(deps, outcome::FAILED);
            let user_id = msg.from.as_ref().map(|u| u.id);
            notify_admin(bot, deps.admin_chat, &error_report(user_id, url, &e.to_string())).await;
        }
    }
    Ok(())
}

async fn send_direct_link(
    bot: &Bot,
    msg: &Message,
    status_id: MessageId,
    video: &ResolvedVideo,
    size: Option<u64>,
    deps: &HandlerDeps,
) -> Result<(), HandlerError> {
    let chat_id = msg.chat.id;
    let limit = deps.max_file_size();
    let Some(link) = video.payload.media_url() else {
        edit_status(bot, chat_id, status_id, &texts::file_too_large(size, limit)).await;
        finish_failed(deps, outcome::FAILED);
        return Ok(());
    };
    log::info!("📎 Video over {}MB limit, sending direct link to chat {}", limit / (1024 * 1024), chat_id.0);

    bot.send_message(chat_id, texts::direct_link(video, size, limit))
        .parse_mode(ParseMode::Html)
        .reply_markup(direct_link_keyboard(link.clone()))
        .reply_parameters(ReplyParameters::new(msg.id))
        .await?;
    delete_status(bot, chat_id, status_id).await;
    deps.stats.record_success();
    metrics::record_download(outcome::LINK_ONLY);
    Ok(())
}

fn finish_failed(deps: &HandlerDeps, outcome: &str) {
    deps.stats.record_failure();
    metrics::record_download(outcome);
}

async fn edit_status(bot: &Bot, chat_id: ChatId, message_id: MessageId, text: &str) {
    if let Err(e) = bot
        .edit_message_text(chat_id, message_id, text)
        .parse_mode(ParseMode::Html)
        .await
    {
        log::warn!("Failed to update status message: {}", e);
    }
}

async fn delete_status(bot: &Bot, chat_id: ChatId, message_id: MessageId) {
    if let Err(e) = bot.delete_message(chat_id, message_id).await {
        log::debug!("Failed to delete status message: {}", e);
    }
}

async fn send_action(bot: &Bot, chat_id: ChatId, action: ChatAction) {
    if let Err(e) = bot.send_chat_action(chat_id, action).await {
        log::debug!("Failed to send chat action: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use tikcore::{ProviderPayload, VideoQuality};

    fn resolved(payload: ProviderPayload) -> ResolvedVideo {
        ResolvedVideo {
            source: "tikwm".to_string(),
            payload,
        }
    }

    #[test]
    fn test_route_upload_when_size_unknown() {
        let payload = ProviderPayload::from_url("https://cdn.test/v.mp4".parse().unwrap(), VideoQuality::Hd);
        assert_eq!(route_for(&resolved(payload), 10), SizeRoute::Upload);
    }

    #[test]
    fn test_route_direct_link_for_oversized_url() {
        let mut payload = ProviderPayload::from_url("https://cdn.test/v.mp4".parse().unwrap(), VideoQuality::Hd);
        payload.size_estimate = Some(80 * 1024 * 1024);
        assert_eq!(route_for(&resolved(payload), 50 * 1024 * 1024), SizeRoute::DirectLink);
    }

    #[test]
    fn test_route_too_large_for_oversized_bytes() {
        let payload = ProviderPayload::from_bytes(Bytes::from(vec![0u8; 2048]), VideoQuality::Unknown);
        assert_eq!(route_for(&resolved(payload), 1024), SizeRoute::TooLarge);
    }

    #[test]
    fn test_route_at_limit_uploads() {
        let payload = ProviderPayload::from_bytes(Bytes::from(vec![0u8; 1024]), VideoQuality::Unknown);
        assert_eq!(route_for(&resolved(payload), 1024), SizeRoute::Upload);
    }
}
