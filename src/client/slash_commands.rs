use std::str::FromStr;

use serenity::{
    all::{
        Command, CommandInteraction, CommandOptionType, CreateCommand, CreateCommandOption,
        CreateInteractionResponse, CreateInteractionResponseFollowup,
        CreateInteractionResponseMessage, EditInteractionResponse,
    },
    client::Context,
};
use strum_macros::{Display, EnumString};
use tracing::{error, info, instrument};

use super::{commands, App};

#[derive(Debug, Display, EnumString)]
#[allow(non_camel_case_types)]
pub enum UserCommand {
    ping,
    track,
    untrack,
    list_tracked,
    set_channel,
    last_race,
    test_post,
}

#[instrument(skip_all, fields(command_name = %command.data.name, user = %command.user.name))]
pub async fn command_responses(command: &CommandInteraction, ctx: Context, app: &App) {
    let result = match UserCommand::from_str(&command.data.name) {
        Ok(user_command) => match user_command {
            UserCommand::ping => commands::ping::ping(ctx.clone(), command).await,
            UserCommand::track => commands::track::track(ctx.clone(), command, app).await,
            UserCommand::untrack => commands::untrack::untrack(ctx.clone(), command, app).await,
            UserCommand::list_tracked => {
                commands::list_tracked::list_tracked(ctx.clone(), command, app).await
            }
            UserCommand::set_channel => {
                commands::set_channel::set_channel(ctx.clone(), command, app).await
            }
            UserCommand::last_race => commands::last_race::last_race(ctx.clone(), command, app).await,
            UserCommand::test_post => commands::test_post::test_post(ctx.clone(), command, app).await,
        },
        Err(why) => {
            error!("Cannot respond to slash command {why}");
            Ok(())
        }
    };

    if let Err(why) = result {
        error!("Error handling command: {why}");
        respond_with_generic_error(&ctx, command).await;
    }
}

/// The user always gets an answer, even when a handler bails. An initial
/// response works before the handler responded; after a defer only a
/// followup is accepted, so fall back to one.
async fn respond_with_generic_error(ctx: &Context, command: &CommandInteraction) {
    let content = "❌ Something went wrong while handling the command.";

    let initial = command
        .create_response(
            &ctx.http,
            CreateInteractionResponse::Message(
                CreateInteractionResponseMessage::new()
                    .content(content)
                    .ephemeral(true),
            ),
        )
        .await;

    if initial.is_err() {
        if let Err(why) = command
            .create_followup(
                &ctx.http,
                CreateInteractionResponseFollowup::new()
                    .content(content)
                    .ephemeral(true),
            )
            .await
        {
            error!("Couldn't deliver the error reply: {why}");
        }
    }
}

/// Create the slash commands
pub async fn create_global_commands(ctx: &Context) -> serenity::Result<()> {
    info!("Creating global slash commands");

    Command::set_global_commands(
        &ctx.http,
        vec![
            CreateCommand::new(UserCommand::ping.to_string()).description("A ping command"),
            CreateCommand::new(UserCommand::track.to_string())
                .description("Start tracking an iRacing driver")
                .add_option(
                    CreateCommandOption::new(
                        CommandOptionType::String,
                        "driver",
                        "Customer ID or driver name to search for",
                    )
                    .required(true),
                ),
            CreateCommand::new(UserCommand::untrack.to_string())
                .description("Stop tracking an iRacing driver")
                .add_option(
                    CreateCommandOption::new(
                        CommandOptionType::Integer,
                        "cust_id",
                        "Customer ID of the driver",
                    )
                    .required(true),
                ),
            CreateCommand::new(UserCommand::list_tracked.to_string())
                .description("List every tracked driver"),
            CreateCommand::new(UserCommand::set_channel.to_string())
                .description("Choose the channel race results are posted to")
                .add_option(
                    CreateCommandOption::new(
                        CommandOptionType::Channel,
                        "channel",
                        "Channel to post race results in",
                    )
                    .required(true),
                ),
            CreateCommand::new(UserCommand::last_race.to_string())
                .description("Show the most recent official race of a driver")
                .add_option(
                    CreateCommandOption::new(
                        CommandOptionType::Integer,
                        "cust_id",
                        "Customer ID of the driver",
                    )
                    .required(true),
                ),
            CreateCommand::new(UserCommand::test_post.to_string())
                .description("Post a sample race result to the configured channel"),
        ],
    )
    .await?;

    Ok(())
}

/// One-line ephemeral reply, used by most command handlers.
pub async fn respond_ephemeral(
    ctx: &Context,
    command: &CommandInteraction,
    content: impl Into<String>,
) -> anyhow::Result<()> {
    command
        .create_response(
            &ctx.http,
            CreateInteractionResponse::Message(
                CreateInteractionResponseMessage::new()
                    .content(content)
                    .ephemeral(true),
            ),
        )
        .await?;

    Ok(())
}

/// Ephemeral followup, for replies after a public defer that only the
/// invoking user should see.
pub async fn followup_ephemeral(
    ctx: &Context,
    command: &CommandInteraction,
    content: impl Into<String>,
) -> anyhow::Result<()> {
    command
        .create_followup(
            &ctx.http,
            CreateInteractionResponseFollowup::new()
                .content(content)
                .ephemeral(true),
        )
        .await?;

    Ok(())
}

/// Replace the deferred "thinking" state with plain text.
pub async fn edit_to_text(
    ctx: &Context,
    command: &CommandInteraction,
    content: impl Into<String>,
) -> anyhow::Result<()> {
    command
        .edit_response(&ctx.http, EditInteractionResponse::new().content(content))
        .await?;

    Ok(())
}
