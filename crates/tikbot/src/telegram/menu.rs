//! Inline keyboards and callback-query handling

use std::str::FromStr;

use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, ParseMode};
use teloxide::{ApiError, RequestError};
use tikcore::{metrics, QualityPreference};
use url::Url;

use super::handlers::HandlerDeps;
use super::texts;

/// Callback data carried by the inline buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::EnumString, strum::AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum MenuAction {
    HelpLink,
    QualitySettings,
    QualityHd,
    QualityStandard,
    ShowStats,
    BackMain,
}

fn button(text: &str, action: MenuAction) -> InlineKeyboardButton {
    InlineKeyboardButton::callback(text.to_string(), action.as_ref().to_string())
}

pub fn main_menu_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![button("📱 How to get TikTok link", MenuAction::HelpLink)],
        vec![button("⚙️ Quality Settings", MenuAction::QualitySettings)],
        vec![button("📊 Bot Stats", MenuAction::ShowStats)],
    ])
}

pub fn back_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![button("🔙 Back", MenuAction::BackMain)]])
}

pub fn stats_keyboard(with_back: bool) -> InlineKeyboardMarkup {
    let mut rows = vec![vec![button("🔄 Refresh", MenuAction::ShowStats)]];
    if with_back {
        rows.push(vec![button("🔙 Back", MenuAction::BackMain)]);
    }
    InlineKeyboardMarkup::new(rows)
}

pub fn quality_keyboard(current: QualityPreference) -> InlineKeyboardMarkup {
    let mark = |q: QualityPreference| if q == current { " ✅" } else { "" };
    InlineKeyboardMarkup::new(vec![
        vec![button(&format!("🔥 Auto HD{}", mark(QualityPreference::Hd)), MenuAction::QualityHd)],
        vec![button(
            &format!("📺 Standard{}", mark(QualityPreference::Standard)),
            MenuAction::QualityStandard,
        )],
        vec![button("🔙 Back", MenuAction::BackMain)],
    ])
}

/// Single URL button for videos too large to upload.
pub fn direct_link_keyboard(url: Url) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::url("⬇️ Download video", url)]])
}

/// Handles a press on one of the menu buttons by editing the menu message in place.
pub async fn handle_menu_callback(bot: Bot, q: CallbackQuery, deps: HandlerDeps) -> Result<(), RequestError> {
    let Some(action) = q.data.as_deref().and_then(|d| MenuAction::from_str(d).ok()) else {
        log::warn!("Unknown callback data: {:?}", q.data);
        bot.answer_callback_query(q.id.clone()).await?;
        return Ok(());
    };
    metrics::record_command(action.as_ref());

    let Some(message) = q.message.as_ref() else {
        bot.answer_callback_query(q.id.clone()).await?;
        return Ok(());
    };
    let chat_id = message.chat().id;
    let message_id = message.id();

    let (text, keyboard) = match action {
        MenuAction::HelpLink => (texts::help_link().to_string(), back_keyboard()),
        MenuAction::QualitySettings => {
            let current = deps.quality_for(chat_id);
            (texts::quality_settings(current), quality_keyboard(current))
        }
        MenuAction::QualityHd | MenuAction::QualityStandard => {
            let quality = if action == MenuAction::QualityHd {
                QualityPreference::Hd
            } else {
                QualityPreference::Standard
            };
            deps.set_quality(chat_id, quality);
            log::info!("Chat {} switched quality to {}", chat_id.0, quality);
            (texts::quality_settings(quality), quality_keyboard(quality))
        }
        MenuAction::ShowStats => (texts::stats(&deps.stats.snapshot()), stats_keyboard(true)),
        MenuAction::BackMain => (texts::main_menu(&q.from.first_name), main_menu_keyboard()),
    };

    let answer = bot.answer_callback_query(q.id.clone());
    match action {
        MenuAction::QualityHd | MenuAction::QualityStandard => {
            answer
                .text(format!("Quality set to {}", texts::quality_label(deps.quality_for(chat_id))))
                .await?;
        }
        _ => {
            answer.await?;
        }
    }

    match bot
        .edit_message_text(chat_id, message_id, text)
        .parse_mode(ParseMode::Html)
        .reply_markup(keyboard)
        .await
    {
        Ok(_) => Ok(()),
        // Refresh / re-select with nothing changed
        Err(RequestError::Api(ApiError::MessageNotModified)) => Ok(()),
        Err(e) => Err(e),
    }
}
