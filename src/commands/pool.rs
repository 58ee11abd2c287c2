//! Betting-pool command handlers.

use chrono::{DateTime, Duration, FixedOffset, Utc};

use crate::{
    dao::models::GameEntity,
    services::{mentions, pool},
};

use super::{CommandResult, context::CommandContext, guards, parse};

pub(super) const ADDGAME_USAGE: &str = "Usage: {prefix}addgame \"<League>\" \"<Home Team>\" \
    \"<Away Team>\" <DD-MM-YYYY> <HH:MM> [minutes before kickoff]\n\n\
    *Example:* {prefix}addgame \"Serie A\" \"Atletico\" \"Cruzeiro\" 09-02-2025 16:00 30\n\
    If [minutes before kickoff] is omitted, guesses stay open until kickoff.";

pub(super) const GUESS_USAGE: &str = "To guess, use:\n\
    \"{prefix}guess <Game ID> <Home Goals>x<Away Goals>\"\n\n\
    *Example:* \"{prefix}guess 1 2x1\"\n\n\
    Use '{prefix}games' to see the IDs of the open games.";

pub(super) const SETTLE_USAGE: &str = "Usage: _{prefix}settle <Game ID> <Home Goals>x<Away Goals>_\n\n\
    *Example:* _{prefix}settle 1 3x0_\n\n\
    Use _{prefix}games_ to see the IDs of the games awaiting a result.";

pub(super) const GUESSES_USAGE: &str = "Usage: `{prefix}guesses <Game ID>`\n\n\
    *Example:* `{prefix}guesses 1`\n\n\
    Use `{prefix}games` to see the game IDs.";

fn format_local(at: DateTime<Utc>, offset: FixedOffset) -> String {
    at.with_timezone(&offset)
        .format("%d/%m/%Y at %H:%M")
        .to_string()
}

fn usage(template: &str, ctx: &CommandContext) -> String {
    template.replace("{prefix}", &ctx.config().prefix)
}

pub(super) async fn addgame(ctx: CommandContext) -> CommandResult {
    guards::require_admin(&ctx).await?;

    if ctx.args.len() < 5 {
        let hint = usage(ADDGAME_USAGE, &ctx);
        ctx.reply(&format!(
            "⚠️ Wrong format! At least 5 arguments are expected.\n{hint}"
        ))
        .await;
        return Ok(());
    }

    let offset = ctx.config().admin_utc_offset;
    let kickoff_at = parse::local_datetime(&ctx.args[3], &ctx.args[4], offset)?;
    let deadline_minutes = match ctx.args.get(5) {
        Some(token) => parse::deadline_minutes(token)?,
        None => 0,
    };

    let request = pool::NewGameRequest {
        league: ctx.args[0].clone(),
        home_team: ctx.args[1].clone(),
        away_team: ctx.args[2].clone(),
        kickoff_at,
        deadline_offset: Duration::minutes(deadline_minutes),
    };

    let (game, house) = pool::add_game(&ctx.state, &ctx.chat_id, request).await?;

    let prefix = &ctx.config().prefix;
    ctx.reply(&format!(
        "✅ Game added to the group pool!\n\n\
         *GAME ID:* {id}\n\
         🏆 *{league}*\n\
         {home} vs {away}\n\
         🗓️ {kickoff}\n\
         🔒 *Guess deadline:* {deadline}\n\n\
         Guess with: {prefix}guess {id} <Home>x<Away>",
        id = game.game_id,
        league = game.league,
        home = game.home_team,
        away = game.away_team,
        kickoff = format_local(game.kickoff_at, offset),
        deadline = format_local(game.guess_deadline, offset),
    ))
    .await;

    if let Some((home, away)) = house {
        let announcement = if home == away {
            format!("My guess is a {home}x{away} draw! 👋")
        } else {
            let favorite = if home > away {
                &game.home_team
            } else {
                &game.away_team
            };
            format!(
                "My guess is {}x{} for {}! 👋",
                home.max(away),
                home.min(away),
                favorite
            )
        };
        ctx.say(&announcement).await;
    }

    Ok(())
}

pub(super) async fn guess(ctx: CommandContext) -> CommandResult {
    guards::require_group(&ctx)?;

    if ctx.args.len() < 2 {
        let hint = usage(GUESS_USAGE, &ctx);
        ctx.reply(&format!("⚠️ Wrong format!\n{hint}")).await;
        return Ok(());
    }

    let game_id = parse::game_id(&ctx.args[0])?;
    let (home, away) = parse::scoreline(&ctx.args[1])?;

    let receipt = pool::register_guess(
        &ctx.state,
        &ctx.chat_id,
        &ctx.sender_id,
        &ctx.sender_name,
        game_id,
        home,
        away,
    )
    .await?;

    ctx.react("✅").await;
    ctx.reply(&format!(
        "🎯 *You guessed:*\n{} {} x {} {}\n\n_Use the same command to edit your guess._",
        receipt.game.home_team, receipt.home_guess, receipt.away_guess, receipt.game.away_team
    ))
    .await;
    Ok(())
}

pub(super) async fn settle(ctx: CommandContext) -> CommandResult {
    guards::require_admin(&ctx).await?;

    if ctx.args.len() < 2 {
        let hint = usage(SETTLE_USAGE, &ctx);
        ctx.reply(&format!("⚠️ Wrong format!\n{hint}")).await;
        return Ok(());
    }

    let game_id = parse::game_id(&ctx.args[0])?;
    let (home, away) = parse::scoreline(&ctx.args[1])?;

    let settlement = pool::settle_result(&ctx.state, game_id, home, away).await?;
    ctx.reply(&format!(
        "✅ Final score recorded: {} {} x {} {}!",
        settlement.game.home_team, home, away, settlement.game.away_team
    ))
    .await;

    if settlement.winners.is_empty() {
        ctx.say("🤷 Nobody nailed the score this time!").await;
        return Ok(());
    }

    let winner_ids: Vec<String> = settlement
        .winners
        .iter()
        .map(|winner| winner.user_id.clone())
        .collect();
    let mentionable = mentions::filter_mentionable(&ctx.state, winner_ids).await?;

    if mentionable.is_empty() {
        ctx.say("🤔 Nobody to mention (every winner opted out of mentions).")
            .await;
    } else {
        let tags = mentions::mention_tags(&mentionable);
        ctx.reply_mentioning(
            &format!("🎉 Congratulations to everyone who nailed the score:\n\n{tags} 🎯"),
            &mentionable,
        )
        .await;
    }
    Ok(())
}

fn game_lines(games: &[GameEntity], offset: FixedOffset) -> String {
    games
        .iter()
        .map(|game| {
            format!(
                "*[{id}]* {home} vs {away}\n🏅 {league}\n🗓️ {kickoff}\n🔒 Guesses until {deadline}\n",
                id = game.game_id,
                home = game.home_team,
                away = game.away_team,
                league = game.league,
                kickoff = format_local(game.kickoff_at, offset),
                deadline = format_local(game.guess_deadline, offset),
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub(super) async fn games(ctx: CommandContext) -> CommandResult {
    guards::require_group(&ctx)?;

    let open = pool::open_games(&ctx.state, &ctx.chat_id).await?;
    let pending = pool::games_awaiting_result(&ctx.state, &ctx.chat_id).await?;

    if open.is_empty() && pending.is_empty() {
        ctx.reply("📭 No games in this group's pool right now. Ask an admin to add one!")
            .await;
        return Ok(());
    }

    let offset = ctx.config().admin_utc_offset;
    let mut text = String::new();
    if !open.is_empty() {
        text.push_str("⚽ *Open for guesses:*\n\n");
        text.push_str(&game_lines(&open, offset));
    }
    if !pending.is_empty() {
        if !text.is_empty() {
            text.push('\n');
        }
        text.push_str("⏳ *Awaiting result:*\n\n");
        text.push_str(&game_lines(&pending, offset));
    }

    ctx.reply(text.trim_end()).await;
    Ok(())
}

pub(super) async fn myguesses(ctx: CommandContext) -> CommandResult {
    guards::require_group(&ctx)?;

    let mine = pool::my_open_guesses(&ctx.state, &ctx.chat_id, &ctx.sender_id).await?;
    if mine.is_empty() {
        ctx.reply(
            "🤔 You have no guesses for upcoming games in this group, or the games you \
             guessed on already took place.",
        )
        .await;
        return Ok(());
    }

    let mut text = String::from("📋 *Your guesses (scheduled games):*\n");
    for item in &mine {
        text.push_str("------------------------------------\n");
        text.push_str(&format!("🏅 *League:* {}\n", item.game.league));
        text.push_str(&format!(
            "🎯 *Your guess:*\n{} {} x {} {}\n",
            item.game.home_team, item.guess.home_guess, item.guess.away_guess, item.game.away_team
        ));
    }
    text.push_str("------------------------------------");

    ctx.reply(&text).await;
    Ok(())
}

pub(super) async fn guesses(ctx: CommandContext) -> CommandResult {
    guards::require_admin(&ctx).await?;

    if ctx.args.is_empty() {
        let hint = usage(GUESSES_USAGE, &ctx);
        ctx.reply(&format!("⚠️ Wrong format! Provide the game ID.\n{hint}"))
            .await;
        return Ok(());
    }

    let game_id = parse::game_id(&ctx.args[0])?;
    let breakdown = pool::guess_breakdown(&ctx.state, game_id, &ctx.chat_id).await?;
    let game = &breakdown.game;

    if breakdown.guesses.is_empty() {
        ctx.reply(&format!(
            "ℹ️ No guesses yet for {} vs {} (ID: {}).",
            game.home_team, game.away_team, game.game_id
        ))
        .await;
        return Ok(());
    }

    let mut text = format!(
        "📊 *Guesses for {} vs {} (ID: {})*\n\n",
        game.home_team, game.away_team, game.game_id
    );
    for guess in &breakdown.guesses {
        let line = if guess.home_guess == guess.away_guess {
            format!(
                "{}: a {}x{} draw\n",
                guess.display_name, guess.home_guess, guess.away_guess
            )
        } else if guess.home_guess > guess.away_guess {
            format!(
                "{}: {}x{} for {}\n",
                guess.display_name, guess.home_guess, guess.away_guess, game.home_team
            )
        } else {
            format!(
                "{}: {}x{} for {}\n",
                guess.display_name, guess.away_guess, guess.home_guess, game.away_team
            )
        };
        text.push_str(&line);
    }

    text.push_str(&format!(
        "\n------------------------------------\n\
         *Summary for this game:*\n\
         🏠 Guesses on {}: {}\n\
         ✈️ Guesses on {}: {}\n\
         🤝 Guesses on a draw: {}\n\
         👥 Total guesses: {}",
        game.home_team,
        breakdown.home_wins,
        game.away_team,
        breakdown.away_wins,
        breakdown.draws,
        breakdown.guesses.len()
    ));

    ctx.reply(&text).await;
    Ok(())
}

pub(super) async fn ranking(ctx: CommandContext) -> CommandResult {
    guards::require_group(&ctx)?;

    let entries = pool::group_ranking(&ctx.state, &ctx.chat_id).await?;
    if entries.is_empty() {
        ctx.reply("📊 This group's ranking is still empty. Add games and guesses to get it started!")
            .await;
        return Ok(());
    }

    let mut text = String::from("🏆 *Group Pool Ranking* 🏆\n\n");
    for (index, entry) in entries.iter().enumerate() {
        let position = match index {
            0 => "🥇".to_owned(),
            1 => "🥈".to_owned(),
            2 => "🥉".to_owned(),
            _ => format!("{}º", index + 1),
        };
        let label = if entry.total_points == 1 {
            "point"
        } else {
            "points"
        };
        text.push_str(&format!(
            "{position} *{}*: {} {label}\n",
            entry.display_name, entry.total_points
        ));
    }

    ctx.reply(text.trim_end()).await;
    Ok(())
}

pub(super) async fn profile(ctx: CommandContext) -> CommandResult {
    guards::require_group(&ctx)?;

    let stats = pool::profile(&ctx.state, &ctx.chat_id, &ctx.sender_id, &ctx.sender_name).await?;
    let position = match stats.position {
        Some(position) => format!("{position}º of {}", stats.ranked_count),
        None => "Not ranked yet".to_owned(),
    };

    ctx.reply(&format!(
        "👤 *Pool profile of {name}* 👤\n\n\
         🏆 *Points:* {points}\n\
         📈 *Ranking:* {position}\n\
         🎯 *Total guesses:* {guesses}\n\
         📊 *Hit rate:* {rate:.2}%",
        name = stats.display_name,
        points = stats.points,
        guesses = stats.total_guesses,
        rate = stats.hit_rate,
    ))
    .await;
    Ok(())
}
