//! Fixed seed data for the photo-sharing graph.
//!
//! `seed_graph` wipes the graph and loads three users with their posts,
//! tags, interactions and notifications. `apply_app_actions` then plays the
//! scripted session of a fourth user signing up.

use anyhow::{Context, Result};
use chrono::NaiveDate;

use lensgraph_types::{Notification, Post, User};

use crate::graph::SocialGraph;

const MADMAX_PHOTO_1: &str = "https://www.instagram.com/p/v6yv-FJ2bL/?hl=en&taken-by=mehmetsonmez";
const MADMAX_PHOTO_2: &str = "https://www.instagram.com/p/u8SyEjp2e5/?hl=en&taken-by=mehmetsonmez";
const TRUTHER_PHOTO: &str = "https://www.instagram.com/p/BA5rmQZhTM3/?hl=en&taken-by=gagehodgen";
const KITTYKAT_PHOTO: &str =
    "https://www.instagram.com/p/BclkypFDRycECL3B_ECrgQ5ZFHsO_HifhL3IqU0/?hl=en&taken-by=kittykat_strong";
const MADMAX_PROFILE: &str = "https://www.instagram.com/mehmetsonmez/";
const TRUTHER_PROFILE: &str = "https://www.instagram.com/gagehodgen/";
const KITTYKAT_PROFILE: &str = "https://www.instagram.com/kittykat_strong/";

pub const TAGS: [&str; 4] = ["nature", "wildlife", "NYC", "portrait"];

const TAGGED: [(i64, &str); 5] = [
    (1, "nature"),
    (1, "wildlife"),
    (2, "nature"),
    (3, "NYC"),
    (4, "portrait"),
];

const MAKES: [(&str, i64); 4] = [("madmax", 1), ("madmax", 2), ("theTruther", 3), ("kittykat", 4)];

const LIKES: [(&str, i64); 5] = [
    ("madmax", 3),
    ("madmax", 4),
    ("theTruther", 4),
    ("kittykat", 1),
    ("kittykat", 2),
];

const COMMENTS: [(&str, &str, i64); 4] = [
    ("kittykat", "wow what a photo", 1),
    ("kittykat", "where was this taken?", 1),
    ("madmax", "lookin good my man", 3),
    ("theTruther", "derp-a derp derp, lol", 4),
];

const BOOKMARKS: [(&str, i64); 3] = [("madmax", 1), ("kittykat", 1), ("kittykat", 3)];

const FOLLOWS: [(&str, &str); 5] = [
    ("madmax", "kittykat"),
    ("madmax", "theTruther"),
    ("theTruther", "madmax"),
    ("kittykat", "madmax"),
    ("kittykat", "theTruther"),
];

const MESSAGES: [(&str, &str, &str); 3] = [
    ("madmax", "Did you see Katherines new photo?", "theTruther"),
    ("theTruther", "Yea, I even left a comment haha", "madmax"),
    ("madmax", "Cool cool", "theTruther"),
];

/// (id, content, target, recipient)
const NOTIFICATIONS: [(i64, &str, &str, &str); 14] = [
    (1, "madmax liked your photo", TRUTHER_PHOTO, "theTruther"),
    (2, "madmax liked your photo", KITTYKAT_PHOTO, "kittykat"),
    (3, "theTruther liked your photo", KITTYKAT_PHOTO, "kittykat"),
    (4, "kittykat liked your photo", MADMAX_PHOTO_1, "madmax"),
    (5, "kittykat liked your photo", MADMAX_PHOTO_2, "madmax"),
    (6, "kittykat commented on your photo", MADMAX_PHOTO_1, "madmax"),
    (7, "kittykat commented on your photo", MADMAX_PHOTO_1, "madmax"),
    (8, "madmax commented on your photo", TRUTHER_PHOTO, "theTruther"),
    (9, "theTruther commented on your photo", KITTYKAT_PHOTO, "kittykat"),
    (10, "madmax started following you", MADMAX_PROFILE, "kittykat"),
    (11, "madmax started following you", MADMAX_PROFILE, "theTruther"),
    (12, "theTruther started following you", TRUTHER_PROFILE, "madmax"),
    (13, "kittykat started following you", KITTYKAT_PROFILE, "madmax"),
    (14, "kittykat started following you", KITTYKAT_PROFILE, "theTruther"),
];

fn ymd(year: i32, month: u32, day: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day)
        .with_context(|| format!("Invalid seed date {}-{}-{}", year, month, day))
}

pub fn seed_users() -> Vec<User> {
    vec![
        User::new("mes2311@columbia.edu", "qwerty", "Mehmet Sonmez", "madmax").with_photo("url1"),
        User::new("ggh2111@columbia.edu", "abcdef", "Gage Hodgen", "theTruther")
            .with_bio("I seek nothing but the truth")
            .with_photo("url2"),
        User::new("ks3310@columbia.edu", "123456", "Katherine Strong", "kittykat")
            .with_bio("NYC Livin - Varsity Frisbee")
            .with_photo("url3"),
    ]
}

pub fn seed_posts() -> Result<Vec<Post>> {
    Ok(vec![
        Post {
            id: 1,
            image_url: MADMAX_PHOTO_1.to_string(),
            caption: "Pictured in South Africa".to_string(),
            posted_on: ymd(2018, 5, 3)?,
        },
        Post {
            id: 2,
            image_url: MADMAX_PHOTO_2.to_string(),
            caption: "Tides crash against an island home to sea lions in the Atlantic Ocean. \
                      Pictured just outside False Bay, South Africa."
                .to_string(),
            posted_on: ymd(2018, 5, 1)?,
        },
        Post {
            id: 3,
            image_url: TRUTHER_PHOTO.to_string(),
            caption: "I didn't believe that it really got cold in New York.".to_string(),
            posted_on: ymd(2018, 4, 30)?,
        },
        Post {
            id: 4,
            image_url: KITTYKAT_PHOTO.to_string(),
            caption: "Smiling, but only softly".to_string(),
            posted_on: ymd(2018, 5, 2)?,
        },
    ])
}

/// The user who signs up during the scripted session
pub fn newcomer() -> User {
    User::new("emstolfo@gmail.com", "nosqldb", "Emily Stolfo", "estolfo")
        .with_bio("Im a ruby engineer at MongoDB")
        .with_photo("profile_photo_URL")
}

/// Wipe the graph and load the fixed data set; event dates use `today`
pub fn seed_graph(graph: &SocialGraph, today: NaiveDate) -> Result<()> {
    graph.clear()?;

    for user in seed_users() {
        graph.users.create(&user)?;
    }
    for post in seed_posts()? {
        graph.posts.create(&post)?;
    }
    for tag in TAGS {
        graph.tags.create(tag)?;
    }

    for (post_id, tag) in TAGGED {
        graph.tags.tag_post(post_id, tag)?;
    }
    for (username, post_id) in MAKES {
        graph.posts.attribute(username, post_id)?;
    }
    for (username, post_id) in LIKES {
        graph.posts.like(username, post_id)?;
    }
    for (username, text, post_id) in COMMENTS {
        graph.posts.comment(username, text, post_id, today)?;
    }
    for (username, post_id) in BOOKMARKS {
        graph.posts.bookmark(username, post_id)?;
    }
    for (follower, followed) in FOLLOWS {
        graph.users.follow(follower, followed)?;
    }
    for (sender, text, recipient) in MESSAGES {
        graph.messages.send(sender, text, recipient, today)?;
    }

    for (id, content, target_url, recipient) in NOTIFICATIONS {
        graph.notifications.create(&Notification {
            id,
            created_on: today,
            content: content.to_string(),
            target_url: target_url.to_string(),
        })?;
        graph.notifications.deliver(recipient, id)?;
    }

    tracing::info!(
        users = 3,
        posts = 4,
        notifications = NOTIFICATIONS.len(),
        "Seeded social graph"
    );
    Ok(())
}

/// Sign up, follow, comment and message as the newcomer
pub fn apply_app_actions(graph: &SocialGraph, today: NaiveDate) -> Result<()> {
    let user = newcomer();
    graph.users.create(&user)?;

    graph.users.follow(&user.username, "madmax")?;
    graph.users.follow(&user.username, "kittykat")?;
    graph.posts.comment(&user.username, "Do you sell prints?", 1, today)?;
    graph.messages.send(&user.username, "Which database is your favorite?", "madmax", today)?;

    tracing::info!(username = %user.username, "Applied scripted app actions");
    Ok(())
}
